//! UniFFI export layer: bindings for a native Thanks Share client.
//!
//! Each public type here maps to a generated class, struct or enum. Objects
//! hand work to a background `AsyncWorker`; the UI drains finished work by
//! calling `poll()` whenever it receives `ThanksEvent::SchedulePoll`.

mod client;
mod composer;
mod moderation;
mod timeline;
mod types;


pub use client::ThanksClient;
pub use composer::ThanksComposer;
pub use moderation::{ThanksConfirm, ThanksModeration};
pub use timeline::ThanksTimeline;
pub use types::{
    ThanksAdminPost, ThanksCandidate, ThanksError, ThanksEvent, ThanksFeed, ThanksInputEvent,
    ThanksLikeState, ThanksMention, ThanksMentionKind, ThanksPost, ThanksReport,
    ThanksReportStatus, ThanksViewScope,
};

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

// ---------------------------------------------------------------------------
// Top-level functions
// ---------------------------------------------------------------------------

#[uniffi::export]
fn engine_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Canonical comparison form used by every search box.
#[uniffi::export]
fn normalize_text(text: String) -> String {
    thanks_core::unicode::normalize(&text)
}

#[uniffi::export]
fn settings_load_config(path: String) -> Result<(), ThanksError> {
    let content = std::fs::read_to_string(&path).map_err(|e| ThanksError::Io {
        msg: format!("{path}: {e}"),
    })?;
    thanks_core::settings::init_custom(content)?;
    Ok(())
}

#[uniffi::export]
fn settings_default_config() -> String {
    thanks_core::settings::DEFAULT_SETTINGS_TOML.to_string()
}

#[uniffi::export]
fn trace_init(log_dir: String) {
    crate::trace_init::init_tracing(Path::new(&log_dir));
}

/// Lock a controller, taking over a poisoned lock as is.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
