//! Optimistic "flip now, confirm later" toggle with a paired counter.
//!
//! The visible state changes synchronously with the click. At most one
//! confirming request is in flight; clicks made meanwhile are queued as the
//! latest intent and sent once the current request settles. A failed request
//! rolls back only its own effect: when a later click already replaced the
//! visible state, that later state is kept and confirmed on its own.

use tracing::{debug, warn};

use crate::types::{Generation, Ticket, ToggleRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleState {
    pub on: bool,
    pub count: u32,
}

impl ToggleState {
    pub fn new(on: bool, count: u32) -> Self {
        Self { on, count }
    }

    /// Flip and adjust the counter in one value; the counter saturates at 0.
    pub fn flipped(self) -> Self {
        if self.on {
            Self {
                on: false,
                count: self.count.saturating_sub(1),
            }
        } else {
            Self {
                on: true,
                count: self.count.saturating_add(1),
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: Ticket,
    /// Click sequence number this request confirms.
    seq: u64,
    on: bool,
}

#[derive(Debug)]
pub struct OptimisticToggle {
    visible: ToggleState,
    /// Last `on` value acknowledged by (or loaded from) the server.
    confirmed_on: bool,
    /// State before the most recent click, restored if that click fails.
    before_last: ToggleState,
    seq: u64,
    in_flight: Option<InFlight>,
    gen: Generation,
}

impl OptimisticToggle {
    pub fn new(initial: ToggleState) -> Self {
        Self {
            visible: initial,
            confirmed_on: initial.on,
            before_last: initial,
            seq: 0,
            in_flight: None,
            gen: Generation::default(),
        }
    }

    pub fn state(&self) -> ToggleState {
        self.visible
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Replace with a server snapshot. Ignored while a request is in flight,
    /// since the snapshot may predate it.
    pub fn reset(&mut self, snapshot: ToggleState) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        *self = Self {
            gen: std::mem::take(&mut self.gen),
            ..Self::new(snapshot)
        };
        true
    }

    /// Apply a click. Returns the request to send, if one can be sent now.
    pub fn toggle(&mut self) -> Option<ToggleRequest> {
        self.before_last = self.visible;
        self.visible = self.visible.flipped();
        self.seq += 1;
        if self.in_flight.is_some() {
            debug!(seq = self.seq, "request in flight; queued");
            return None;
        }
        self.send_if_diverged()
    }

    /// Settle the in-flight request. Returns a follow-up request when the
    /// visible state still differs from what the server holds.
    pub fn complete(&mut self, ticket: Ticket, ok: bool) -> Option<ToggleRequest> {
        let flight = match self.in_flight {
            Some(f) if f.ticket == ticket => f,
            _ => {
                debug!(?ticket, "dropping stale toggle completion");
                return None;
            }
        };
        self.in_flight = None;

        if ok {
            self.confirmed_on = flight.on;
        } else if flight.seq == self.seq {
            warn!(?ticket, on = flight.on, "toggle failed; rolling back");
            self.visible = self.before_last;
        } else {
            warn!(?ticket, on = flight.on, "toggle failed; newer click kept");
        }
        self.send_if_diverged()
    }

    fn send_if_diverged(&mut self) -> Option<ToggleRequest> {
        if self.visible.on == self.confirmed_on {
            return None;
        }
        let ticket = self.gen.next();
        self.in_flight = Some(InFlight {
            ticket,
            seq: self.seq,
            on: self.visible.on,
        });
        Some(ToggleRequest {
            ticket,
            on: self.visible.on,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_adjusts_count() {
        assert_eq!(ToggleState::new(false, 3).flipped(), ToggleState::new(true, 4));
        assert_eq!(ToggleState::new(true, 4).flipped(), ToggleState::new(false, 3));
        assert_eq!(ToggleState::new(true, 0).flipped(), ToggleState::new(false, 0));
    }

    #[test]
    fn test_like_then_failure_reverts() {
        let mut t = OptimisticToggle::new(ToggleState::new(false, 3));
        let req = t.toggle().unwrap();
        assert!(req.on);
        assert_eq!(t.state(), ToggleState::new(true, 4));

        assert!(t.complete(req.ticket, false).is_none());
        assert_eq!(t.state(), ToggleState::new(false, 3));
        assert!(!t.is_pending());
    }

    #[test]
    fn test_success_keeps_state() {
        let mut t = OptimisticToggle::new(ToggleState::new(false, 3));
        let req = t.toggle().unwrap();
        assert!(t.complete(req.ticket, true).is_none());
        assert_eq!(t.state(), ToggleState::new(true, 4));
    }

    #[test]
    fn test_second_click_waits_for_first() {
        let mut t = OptimisticToggle::new(ToggleState::new(false, 3));
        let first = t.toggle().unwrap();
        assert!(t.toggle().is_none());
        assert_eq!(t.state(), ToggleState::new(false, 3));

        // Like confirmed, but the user has since unliked: send the unlike.
        let follow = t.complete(first.ticket, true).unwrap();
        assert!(!follow.on);
        assert!(t.complete(follow.ticket, true).is_none());
        assert_eq!(t.state(), ToggleState::new(false, 3));
    }

    #[test]
    fn test_late_failure_does_not_override_newer_click() {
        let mut t = OptimisticToggle::new(ToggleState::new(false, 3));
        let first = t.toggle().unwrap();
        t.toggle();
        // Unlike is now visible. The like fails: the unlike already matches the
        // server, so nothing is sent and the visible state stays.
        assert!(t.complete(first.ticket, false).is_none());
        assert_eq!(t.state(), ToggleState::new(false, 3));
    }

    #[test]
    fn test_failure_with_even_newer_clicks_confirms_latest() {
        let mut t = OptimisticToggle::new(ToggleState::new(false, 3));
        let first = t.toggle().unwrap();
        t.toggle();
        t.toggle();
        assert_eq!(t.state(), ToggleState::new(true, 4));

        let retry = t.complete(first.ticket, false).unwrap();
        assert!(retry.on);
        assert_eq!(t.state(), ToggleState::new(true, 4));

        // If the latest click's own request fails, it rolls back.
        assert!(t.complete(retry.ticket, false).is_none());
        assert_eq!(t.state(), ToggleState::new(false, 3));
    }

    #[test]
    fn test_stale_ticket_ignored() {
        let mut t = OptimisticToggle::new(ToggleState::new(false, 3));
        let req = t.toggle().unwrap();
        assert!(t.complete(Ticket(req.ticket.0 + 7), false).is_none());
        assert_eq!(t.state(), ToggleState::new(true, 4));
        assert!(t.is_pending());
    }

    #[test]
    fn test_reset_skipped_while_pending() {
        let mut t = OptimisticToggle::new(ToggleState::new(false, 3));
        let req = t.toggle().unwrap();
        assert!(!t.reset(ToggleState::new(false, 10)));
        t.complete(req.ticket, true);
        assert!(t.reset(ToggleState::new(false, 10)));
        assert_eq!(t.state(), ToggleState::new(false, 10));
    }
}
