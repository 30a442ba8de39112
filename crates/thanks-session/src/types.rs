use thanks_core::model::{PostId, PostSubmission, ReportId, ReportSubmission};
use thanks_core::moderation::{ReportStatus, ViewScope};

/// Generation-stamped handle tying a completion back to the request that
/// produced it. A controller only accepts the completion for the ticket it
/// is currently waiting on; anything else is stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(pub u64);

/// Monotonic ticket source, one per controller instance.
#[derive(Debug, Default)]
pub(crate) struct Generation(u64);

impl Generation {
    pub(crate) fn next(&mut self) -> Ticket {
        self.0 += 1;
        Ticket(self.0)
    }

    pub(crate) fn current(&self) -> Ticket {
        Ticket(self.0)
    }

    /// Advance without issuing, so every outstanding ticket becomes stale.
    pub(crate) fn invalidate(&mut self) {
        self.0 += 1;
    }
}

/// Outcome of a request as seen by the controllers: the transport layer
/// turns every failure into a message for the error slot.
pub type Completion<T> = Result<T, String>;

/// Candidate lookups issued by the mention resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRequest {
    /// Server-side user search for an already-normalized query.
    Users { ticket: Ticket, query: String },
    /// Full department list, fetched once per resolver.
    Departments { ticket: Ticket },
}

impl LookupRequest {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Users { ticket, .. } | Self::Departments { ticket } => *ticket,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub ticket: Ticket,
    pub payload: PostSubmission,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub ticket: Ticket,
    pub payload: ReportSubmission,
}

/// Confirm (`on = true`) or revoke the toggle on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleRequest {
    pub ticket: Ticket,
    pub on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeRequest {
    pub post_id: PostId,
    pub ticket: Ticket,
    pub liked: bool,
}

/// Handle to one admin list owned by a `ModerationBoard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRequest {
    pub view: ViewId,
    pub ticket: Ticket,
    pub scope: ViewScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequest {
    pub ticket: Ticket,
    pub report_id: ReportId,
    pub status: ReportStatus,
}
