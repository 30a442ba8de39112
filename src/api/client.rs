use std::sync::Arc;
use std::time::Duration;

use thanks_core::settings::settings;

use crate::async_worker::AsyncWorker;
use crate::transport::{HttpTransport, Transport};

use super::{ThanksComposer, ThanksError, ThanksModeration, ThanksTimeline};

/// Connection to one server. Hands out per-screen controllers that share
/// its transport.
#[derive(uniffi::Object)]
pub struct ThanksClient {
    transport: Arc<dyn Transport>,
}

#[uniffi::export]
impl ThanksClient {
    #[uniffi::constructor]
    pub fn new(base_url: String, token: Option<String>) -> Arc<Self> {
        let timeout = Duration::from_secs(settings().api.timeout_secs);
        Self::with_transport(Arc::new(HttpTransport::new(&base_url, token, timeout)))
    }

    /// Client for the configured `[api] base_url`.
    #[uniffi::constructor]
    pub fn from_settings(token: Option<String>) -> Arc<Self> {
        Self::with_transport(Arc::new(HttpTransport::from_settings(token)))
    }

    pub fn composer(&self) -> Result<Arc<ThanksComposer>, ThanksError> {
        Ok(ThanksComposer::create(self.worker()?))
    }

    pub fn timeline(&self) -> Result<Arc<ThanksTimeline>, ThanksError> {
        Ok(ThanksTimeline::create(self.worker()?))
    }

    pub fn moderation(&self) -> Result<Arc<ThanksModeration>, ThanksError> {
        Ok(ThanksModeration::create(self.worker()?))
    }
}

impl ThanksClient {
    pub(crate) fn with_transport(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self { transport })
    }

    fn worker(&self) -> Result<AsyncWorker, ThanksError> {
        let debounce = Duration::from_millis(settings().search.debounce_ms);
        Ok(AsyncWorker::new(Arc::clone(&self.transport), debounce)?)
    }
}
