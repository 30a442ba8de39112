//! Client engine for Thanks Share.
//!
//! The pure model lives in `thanks-core`, the per-screen controllers in
//! `thanks-session`. This crate adds the HTTP transport, the background
//! request worker and the UniFFI objects a native UI drives.

uniffi::setup_scaffolding!();

pub mod api;
mod async_worker;
pub mod trace_init;
pub mod transport;

pub use thanks_core::{draft, model, moderation, settings, unicode};
pub use thanks_session as session;
