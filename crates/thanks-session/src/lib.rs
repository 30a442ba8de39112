//! Per-view stateful controllers for the Thanks Share client.
//!
//! Every controller is sans-IO: operations return request descriptors that
//! carry a `Ticket`, and the caller hands the outcome back through the
//! matching `receive_*`/`complete` method. A completion whose ticket is no
//! longer the one the controller waits on is dropped.

pub(crate) mod types;

mod composer;
mod confirm;
mod input;
mod likes;
mod mention;
mod moderation;
mod toggle;

#[cfg(test)]
mod tests;

pub use composer::{PostComposer, ReportComposer};
pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm};
pub use input::{CompositionInput, InputEvent, InputOutcome, InputState};
pub use likes::LikeBoard;
pub use mention::{MentionResolver, ResolverLimits};
pub use moderation::{
    confirm_prompt, ModerationBoard, ModerationError, PostProjection, ViewProjection,
};
pub use toggle::{OptimisticToggle, ToggleState};
pub use types::{
    Completion, LikeRequest, LookupRequest, ReportRequest, StatusRequest, SubmitRequest, Ticket,
    ToggleRequest, ViewId, ViewRequest,
};
