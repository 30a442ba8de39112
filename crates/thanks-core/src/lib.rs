//! Pure building blocks for the Thanks Share client: the script normalizer,
//! wire records, draft validation, report lifecycle rules and settings.
//!
//! Nothing here performs I/O or holds per-view state; the stateful
//! controllers live in `thanks-session`.

pub mod draft;
pub mod model;
pub mod moderation;
pub mod settings;
pub mod unicode;
