//! Wire and domain records shared by the session layer and the transport.

use serde::{Deserialize, Serialize};

use crate::moderation::ReportStatus;

pub type UserId = u64;
pub type DepartmentId = u64;
pub type PostId = u64;
pub type ReportId = u64;

/// What a mention points at. Each kind has its own id space and data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionKind {
    User,
    Department,
}

impl MentionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Department => "department",
        }
    }
}

/// A committed mention in a draft. Identity is `(kind, id)`; the display
/// name is carried for rendering only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionRef {
    pub id: u64,
    pub display_name: String,
    pub kind: MentionKind,
}

impl MentionRef {
    pub fn key(&self) -> (MentionKind, u64) {
        (self.kind, self.id)
    }
}

/// A search result. Regenerated per query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: u64,
    pub name: String,
    pub kind: MentionKind,
    /// Department name shown next to a user candidate.
    pub extra_label: Option<String>,
}

impl Candidate {
    pub fn to_ref(&self) -> MentionRef {
        MentionRef {
            id: self.id,
            display_name: self.name.clone(),
            kind: self.kind,
        }
    }
}

/// Row of the user search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub department_name: Option<String>,
}

impl From<UserRecord> for Candidate {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            name: u.name,
            kind: MentionKind::User,
            extra_label: u.department_name,
        }
    }
}

/// Row of the department list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentRecord {
    pub id: DepartmentId,
    pub name: String,
}

impl From<DepartmentRecord> for Candidate {
    fn from(d: DepartmentRecord) -> Self {
        Self {
            id: d.id,
            name: d.name,
            kind: MentionKind::Department,
            extra_label: None,
        }
    }
}

/// Body of `POST /posts/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSubmission {
    pub content: String,
    pub mention_user_ids: Vec<UserId>,
    pub mention_department_ids: Vec<DepartmentId>,
}

/// Body of `POST /reports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSubmission {
    pub reported_post_id: PostId,
    pub reason: String,
}

/// Body of `PATCH /admin/reports/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub status: ReportStatus,
}

/// Timeline row. Older servers omit the like fields.
#[derive(Debug, Clone, Deserialize)]
pub struct TimelinePost {
    pub id: PostId,
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub mention_user_names: Vec<String>,
    #[serde(default)]
    pub mention_department_names: Vec<String>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked_by_me: bool,
}

/// A report as embedded in an admin post row.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRecord {
    pub id: ReportId,
    #[serde(default)]
    pub reporter_user_id: Option<UserId>,
    #[serde(default)]
    pub reporter_name: Option<String>,
    pub reason: String,
    pub status: ReportStatus,
}

/// Row of `/admin/posts/` and `/admin/posts/deleted`.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminPostRecord {
    pub id: PostId,
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub mention_user_ids: Vec<UserId>,
    #[serde(default)]
    pub reports: Vec<ReportRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_to_candidate() {
        let json = r#"{"id": 7, "name": "田中 花子", "department_id": 2, "department_name": "営業部"}"#;
        let u: UserRecord = serde_json::from_str(json).unwrap();
        let c = Candidate::from(u);
        assert_eq!(c.kind, MentionKind::User);
        assert_eq!(c.extra_label.as_deref(), Some("営業部"));
        assert_eq!(c.to_ref().key(), (MentionKind::User, 7));
    }

    #[test]
    fn test_user_record_without_department() {
        let u: UserRecord = serde_json::from_str(r#"{"id": 1, "name": "Sato"}"#).unwrap();
        assert!(u.department_id.is_none());
        assert!(Candidate::from(u).extra_label.is_none());
    }

    #[test]
    fn test_admin_post_record_defaults() {
        let json = r#"{
            "id": 3,
            "content": "ありがとう",
            "created_at": "2024-05-01T09:00:00",
            "reports": [{"id": 9, "reason": "spam", "status": "pending"}]
        }"#;
        let p: AdminPostRecord = serde_json::from_str(json).unwrap();
        assert!(p.author_name.is_none());
        assert!(p.mention_user_ids.is_empty());
        assert_eq!(p.reports[0].status, ReportStatus::Pending);
    }

    #[test]
    fn test_timeline_post_like_defaults() {
        let json = r#"{"id": 1, "content": "x", "created_at": "2024-05-01T09:00:00"}"#;
        let p: TimelinePost = serde_json::from_str(json).unwrap();
        assert_eq!(p.like_count, 0);
        assert!(!p.liked_by_me);
    }

    #[test]
    fn test_status_update_wire_format() {
        let body = serde_json::to_string(&StatusUpdate {
            status: ReportStatus::Deleted,
        })
        .unwrap();
        assert_eq!(body, r#"{"status":"deleted"}"#);
    }
}
