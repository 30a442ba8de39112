//! Property-based tests for the optimistic toggle.
//!
//! A simulated network settles the single in-flight request at random
//! points. The server's view is tracked alongside so that the controller can
//! be checked against what was actually acknowledged.

use proptest::prelude::*;

use crate::toggle::{OptimisticToggle, ToggleState};
use crate::types::ToggleRequest;

#[derive(Debug, Clone)]
enum Action {
    Click,
    Settle(bool),
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => Just(Action::Click),
        2 => any::<bool>().prop_map(Action::Settle),
    ]
}

fn arb_initial() -> impl Strategy<Value = ToggleState> {
    (any::<bool>(), 1u32..50).prop_map(|(on, count)| ToggleState::new(on, count))
}

struct Harness {
    toggle: OptimisticToggle,
    in_flight: Option<ToggleRequest>,
    server_on: bool,
    initial: ToggleState,
}

impl Harness {
    fn new(initial: ToggleState) -> Self {
        Self {
            toggle: OptimisticToggle::new(initial),
            in_flight: None,
            server_on: initial.on,
            initial,
        }
    }

    fn click(&mut self) -> Result<(), TestCaseError> {
        let sent = self.toggle.toggle();
        if self.in_flight.is_some() {
            prop_assert!(sent.is_none(), "second request while one is in flight");
        } else {
            self.in_flight = sent;
        }
        Ok(())
    }

    fn settle(&mut self, ok: bool) {
        if let Some(req) = self.in_flight.take() {
            if ok {
                self.server_on = req.on;
            }
            self.in_flight = self.toggle.complete(req.ticket, ok);
        }
    }

    fn drain(&mut self, ok: bool) {
        for _ in 0..4 {
            self.settle(ok);
        }
    }

    fn check(&self) -> Result<(), TestCaseError> {
        let state = self.toggle.state();
        let expected = self.initial.count - u32::from(self.initial.on) + u32::from(state.on);
        prop_assert_eq!(state.count, expected);
        prop_assert_eq!(self.toggle.is_pending(), self.in_flight.is_some());
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_all_success_applies_every_click(
        initial in arb_initial(),
        actions in prop::collection::vec(arb_action(), 0..40),
    ) {
        let mut h = Harness::new(initial);
        let mut clicks = 0usize;
        for action in actions {
            match action {
                Action::Click => {
                    clicks += 1;
                    h.click()?;
                }
                Action::Settle(_) => h.settle(true),
            }
            h.check()?;
        }
        h.drain(true);
        let expected_on = initial.on ^ (clicks % 2 == 1);
        prop_assert_eq!(h.toggle.state().on, expected_on);
        prop_assert_eq!(h.server_on, expected_on);
        prop_assert!(!h.toggle.is_pending());
    }

    #[test]
    fn prop_settled_state_matches_server(
        initial in arb_initial(),
        actions in prop::collection::vec(arb_action(), 0..40),
        final_ok in any::<bool>(),
    ) {
        let mut h = Harness::new(initial);
        for action in actions {
            match action {
                Action::Click => h.click()?,
                Action::Settle(ok) => h.settle(ok),
            }
            h.check()?;
        }
        h.drain(final_ok);
        h.check()?;
        prop_assert!(!h.toggle.is_pending());
        prop_assert_eq!(h.toggle.state().on, h.server_on);
    }

    #[test]
    fn prop_single_failure_undoes_only_itself(initial in arb_initial(), before in 0usize..4) {
        let mut h = Harness::new(initial);
        // Some confirmed clicks, then one that fails.
        for _ in 0..before {
            h.click()?;
            h.settle(true);
        }
        let settled = h.toggle.state();
        h.click()?;
        h.settle(false);
        prop_assert_eq!(h.toggle.state(), settled);
    }
}
