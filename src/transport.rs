//! HTTP access to the Thanks Share API.
//!
//! The worker threads talk to the server only through `Transport`, so tests
//! can swap in a scripted implementation.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use thanks_core::model::{
    AdminPostRecord, DepartmentRecord, PostId, PostSubmission, ReportId, ReportSubmission,
    StatusUpdate, TimelinePost, UserRecord,
};
use thanks_core::moderation::{ReportStatus, ViewScope};
use thanks_core::settings::settings;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<ureq::Error> for TransportError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code) => Self::Status(code),
            other => Self::Network(other.to_string()),
        }
    }
}

/// Which timeline to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    All,
    /// Posts that mention the signed-in user or their department.
    Mentioned,
}

pub trait Transport: Send + Sync {
    fn search_users(&self, query: &str) -> Result<Vec<UserRecord>, TransportError>;
    fn list_departments(&self) -> Result<Vec<DepartmentRecord>, TransportError>;
    fn set_like(&self, post_id: PostId, liked: bool) -> Result<(), TransportError>;
    fn update_report_status(
        &self,
        report_id: ReportId,
        status: ReportStatus,
    ) -> Result<(), TransportError>;
    fn admin_posts(&self, scope: ViewScope) -> Result<Vec<AdminPostRecord>, TransportError>;
    fn timeline(&self, feed: Feed) -> Result<Vec<TimelinePost>, TransportError>;
    fn create_post(&self, payload: &PostSubmission) -> Result<(), TransportError>;
    fn report_post(&self, payload: &ReportSubmission) -> Result<(), TransportError>;
}

pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Transport for the configured `[api]` section.
    pub fn from_settings(token: Option<String>) -> Self {
        let api = &settings().api;
        Self::new(&api.base_url, token, Duration::from_secs(api.timeout_secs))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize<B>(&self, req: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {token}")),
            None => req,
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TransportError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let mut req = self.authorize(self.agent.get(&url));
        for (key, value) in query {
            req = req.query(*key, *value);
        }
        let body = req
            .call()
            .inspect_err(|e| warn!(%url, error = %e, "GET failed"))?
            .into_body()
            .read_to_string()?;
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(format!("{url}: {e}")))
    }

    fn send_json<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
    ) -> Result<(), TransportError> {
        let url = self.url(path);
        let body =
            serde_json::to_string(payload).map_err(|e| TransportError::Decode(e.to_string()))?;
        debug!(%url, ?method, "send");
        let req = match method {
            Method::Post => self.agent.post(&url),
            Method::Patch => self.agent.patch(&url),
        };
        self.authorize(req)
            .header("Content-Type", "application/json")
            .send(body)
            .inspect_err(|e| warn!(%url, error = %e, "request failed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Post,
    Patch,
}

impl Transport for HttpTransport {
    fn search_users(&self, query: &str) -> Result<Vec<UserRecord>, TransportError> {
        self.get_json("/users/search", &[("q", query)])
    }

    fn list_departments(&self) -> Result<Vec<DepartmentRecord>, TransportError> {
        self.get_json("/departments/", &[])
    }

    fn set_like(&self, post_id: PostId, liked: bool) -> Result<(), TransportError> {
        let url = self.url(&format!("/posts/{post_id}/like"));
        debug!(%url, liked, "like");
        if liked {
            self.authorize(self.agent.post(&url)).send_empty()?;
        } else {
            self.authorize(self.agent.delete(&url)).call()?;
        }
        Ok(())
    }

    fn update_report_status(
        &self,
        report_id: ReportId,
        status: ReportStatus,
    ) -> Result<(), TransportError> {
        self.send_json(
            Method::Patch,
            &format!("/admin/reports/{report_id}"),
            &StatusUpdate { status },
        )
    }

    fn admin_posts(&self, scope: ViewScope) -> Result<Vec<AdminPostRecord>, TransportError> {
        // Only deleted posts have their own endpoint; the other scopes are
        // filtered client-side from the full list.
        match scope {
            ViewScope::Deleted => self.get_json("/admin/posts/deleted", &[]),
            ViewScope::Active | ViewScope::Reported | ViewScope::All => {
                self.get_json("/admin/posts/", &[])
            }
        }
    }

    fn timeline(&self, feed: Feed) -> Result<Vec<TimelinePost>, TransportError> {
        match feed {
            Feed::All => self.get_json("/posts/", &[]),
            Feed::Mentioned => self.get_json("/posts/mentioned", &[]),
        }
    }

    fn create_post(&self, payload: &PostSubmission) -> Result<(), TransportError> {
        self.send_json(Method::Post, "/posts/", payload)
    }

    fn report_post(&self, payload: &ReportSubmission) -> Result<(), TransportError> {
        self.send_json(Method::Post, "/reports", payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let t = HttpTransport::new("http://localhost:8000/", None, Duration::from_secs(1));
        assert_eq!(t.url("/posts/"), "http://localhost:8000/posts/");
    }

    #[test]
    fn test_status_error_keeps_code() {
        let err = TransportError::from(ureq::Error::StatusCode(403));
        assert_eq!(err, TransportError::Status(403));
        assert_eq!(err.to_string(), "server returned HTTP 403");
    }

    #[test]
    fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) is closed on test machines.
        let t = HttpTransport::new("http://127.0.0.1:9", None, Duration::from_millis(500));
        assert!(matches!(t.list_departments(), Err(TransportError::Network(_))));
    }
}
