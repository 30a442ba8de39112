//! Report lifecycle rules and the derived per-post effective status.
//!
//! A report starts `pending` and moves exactly once to `deleted` or
//! `ignored`. A post's effective status is derived from all of its reports:
//! any `deleted` wins, then any `pending`, else `ignored`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{PostId, ReportId, ReportRecord, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Deleted,
    Ignored,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Deleted => "deleted",
            Self::Ignored => "ignored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Validate a requested transition. `pending → pending` is accepted as a
    /// no-op so that a status selector can be re-submitted unchanged.
    pub fn transition(self, to: ReportStatus) -> Result<ReportStatus, TransitionError> {
        match (self, to) {
            (Self::Pending, to) => Ok(to),
            (from, to) => Err(TransitionError::AlreadyResolved { from, to }),
        }
    }

    /// Merge a freshly fetched status into the locally known one. Terminal
    /// states are sticky, so a stale fetch never moves a report back.
    pub fn reconcile(self, fetched: ReportStatus) -> ReportStatus {
        if self.is_terminal() {
            self
        } else {
            fetched
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "deleted" => Ok(Self::Deleted),
            "ignored" => Ok(Self::Ignored),
            other => Err(TransitionError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("report is already {from}; cannot change it to {to}")]
    AlreadyResolved { from: ReportStatus, to: ReportStatus },
    #[error("unknown report status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: ReportId,
    pub post_id: PostId,
    pub reporter_id: Option<UserId>,
    pub reporter_name: Option<String>,
    pub reason: String,
    pub status: ReportStatus,
}

impl Report {
    pub fn from_record(post_id: PostId, r: ReportRecord) -> Self {
        Self {
            id: r.id,
            post_id,
            reporter_id: r.reporter_user_id,
            reporter_name: r.reporter_name,
            reason: r.reason,
            status: r.status,
        }
    }
}

/// Effective status of a post from the statuses of its reports.
/// `None` when the post has no reports.
pub fn effective_status<I>(statuses: I) -> Option<ReportStatus>
where
    I: IntoIterator<Item = ReportStatus>,
{
    let mut result = None;
    for status in statuses {
        match status {
            ReportStatus::Deleted => return Some(ReportStatus::Deleted),
            ReportStatus::Pending => result = Some(ReportStatus::Pending),
            ReportStatus::Ignored => {
                if result.is_none() {
                    result = Some(ReportStatus::Ignored);
                }
            }
        }
    }
    result
}

/// The status subset an admin view lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewScope {
    /// Posts with at least one unresolved report.
    Active,
    /// Posts removed by moderation.
    Deleted,
    /// Every post that has been reported, whatever the outcome.
    Reported,
    /// Every post, reported or not.
    All,
}

impl ViewScope {
    pub fn includes(&self, status: Option<ReportStatus>) -> bool {
        match self {
            Self::Active => status == Some(ReportStatus::Pending),
            Self::Deleted => status == Some(ReportStatus::Deleted),
            Self::Reported => status.is_some(),
            Self::All => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
            Self::Reported => "reported",
            Self::All => "all",
        }
    }
}

impl FromStr for ViewScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "deleted" => Ok(Self::Deleted),
            "reported" => Ok(Self::Reported),
            "all" => Ok(Self::All),
            other => Err(format!("unknown view scope: {other}")),
        }
    }
}
