use thanks_core::draft::DraftError;
use thanks_core::model::{Candidate, MentionKind, MentionRef, TimelinePost};
use thanks_core::moderation::{Report, ReportStatus, ViewScope};
use thanks_core::settings::SettingsError;
use thanks_session::{ModerationError, PostProjection, ToggleState};

use crate::transport::Feed;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ThanksError {
    #[error("IO error: {msg}")]
    Io { msg: String },
    #[error("invalid input: {msg}")]
    Invalid { msg: String },
    #[error("rejected: {msg}")]
    Rejected { msg: String },
    #[error("internal error: {msg}")]
    Internal { msg: String },
}

impl From<DraftError> for ThanksError {
    fn from(e: DraftError) -> Self {
        Self::Invalid { msg: e.to_string() }
    }
}

impl From<ModerationError> for ThanksError {
    fn from(e: ModerationError) -> Self {
        Self::Rejected { msg: e.to_string() }
    }
}

impl From<SettingsError> for ThanksError {
    fn from(e: SettingsError) -> Self {
        Self::Invalid { msg: e.to_string() }
    }
}

impl From<std::io::Error> for ThanksError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { msg: e.to_string() }
    }
}

// ---------------------------------------------------------------------------
// Records (value types, copied across FFI boundary)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, uniffi::Record)]
pub struct ThanksCandidate {
    pub id: u64,
    pub name: String,
    pub kind: ThanksMentionKind,
    pub extra_label: Option<String>,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct ThanksMention {
    pub id: u64,
    pub display_name: String,
    pub kind: ThanksMentionKind,
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct ThanksLikeState {
    pub post_id: u64,
    pub liked: bool,
    pub count: u32,
    /// A confirming request is still in flight.
    pub pending: bool,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct ThanksPost {
    pub id: u64,
    pub content: String,
    pub created_at: String,
    pub mention_user_names: Vec<String>,
    pub mention_department_names: Vec<String>,
    pub liked: bool,
    pub like_count: u32,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct ThanksReport {
    pub id: u64,
    pub reporter_name: Option<String>,
    pub reason: String,
    pub status: ThanksReportStatus,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct ThanksAdminPost {
    pub id: u64,
    pub content: String,
    pub created_at: String,
    pub author_name: Option<String>,
    pub department_name: Option<String>,
    pub status: Option<ThanksReportStatus>,
    pub reports: Vec<ThanksReport>,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum ThanksMentionKind {
    User,
    Department,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum ThanksReportStatus {
    Pending,
    Deleted,
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum ThanksViewScope {
    Active,
    Deleted,
    Reported,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum ThanksFeed {
    All,
    Mentioned,
}

/// Text field events forwarded from the native mention search box.
#[derive(Clone, Debug, uniffi::Enum)]
pub enum ThanksInputEvent {
    CompositionStart,
    CompositionUpdate { text: String },
    CompositionEnd { text: String },
    Text { text: String },
    Commit,
}

#[derive(Clone, Debug, uniffi::Enum)]
pub enum ThanksEvent {
    ShowCandidates {
        candidates: Vec<ThanksCandidate>,
    },
    MentionsChanged {
        mentions: Vec<ThanksMention>,
    },
    ShowError {
        message: String,
    },
    ClearError,
    /// The post was accepted; the draft has been cleared.
    Submitted,
    LikeChanged {
        state: ThanksLikeState,
    },
    TimelineLoaded {
        posts: Vec<ThanksPost>,
    },
    ReportSent {
        post_id: u64,
    },
    ViewChanged {
        view_id: u32,
        posts: Vec<ThanksAdminPost>,
    },
    /// Work is still in flight; call `poll` again shortly.
    SchedulePoll,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

impl From<MentionKind> for ThanksMentionKind {
    fn from(k: MentionKind) -> Self {
        match k {
            MentionKind::User => Self::User,
            MentionKind::Department => Self::Department,
        }
    }
}

impl From<ThanksMentionKind> for MentionKind {
    fn from(k: ThanksMentionKind) -> Self {
        match k {
            ThanksMentionKind::User => Self::User,
            ThanksMentionKind::Department => Self::Department,
        }
    }
}

impl From<ReportStatus> for ThanksReportStatus {
    fn from(s: ReportStatus) -> Self {
        match s {
            ReportStatus::Pending => Self::Pending,
            ReportStatus::Deleted => Self::Deleted,
            ReportStatus::Ignored => Self::Ignored,
        }
    }
}

impl From<ThanksReportStatus> for ReportStatus {
    fn from(s: ThanksReportStatus) -> Self {
        match s {
            ThanksReportStatus::Pending => Self::Pending,
            ThanksReportStatus::Deleted => Self::Deleted,
            ThanksReportStatus::Ignored => Self::Ignored,
        }
    }
}

impl From<ThanksViewScope> for ViewScope {
    fn from(s: ThanksViewScope) -> Self {
        match s {
            ThanksViewScope::Active => Self::Active,
            ThanksViewScope::Deleted => Self::Deleted,
            ThanksViewScope::Reported => Self::Reported,
            ThanksViewScope::All => Self::All,
        }
    }
}

impl From<ThanksFeed> for Feed {
    fn from(f: ThanksFeed) -> Self {
        match f {
            ThanksFeed::All => Self::All,
            ThanksFeed::Mentioned => Self::Mentioned,
        }
    }
}

impl From<&Candidate> for ThanksCandidate {
    fn from(c: &Candidate) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            kind: c.kind.into(),
            extra_label: c.extra_label.clone(),
        }
    }
}

impl From<ThanksCandidate> for Candidate {
    fn from(c: ThanksCandidate) -> Self {
        Self {
            id: c.id,
            name: c.name,
            kind: c.kind.into(),
            extra_label: c.extra_label,
        }
    }
}

impl From<&MentionRef> for ThanksMention {
    fn from(m: &MentionRef) -> Self {
        Self {
            id: m.id,
            display_name: m.display_name.clone(),
            kind: m.kind.into(),
        }
    }
}

impl From<&Report> for ThanksReport {
    fn from(r: &Report) -> Self {
        Self {
            id: r.id,
            reporter_name: r.reporter_name.clone(),
            reason: r.reason.clone(),
            status: r.status.into(),
        }
    }
}

impl From<&PostProjection> for ThanksAdminPost {
    fn from(p: &PostProjection) -> Self {
        Self {
            id: p.id,
            content: p.content.clone(),
            created_at: p.created_at.clone(),
            author_name: p.author_name.clone(),
            department_name: p.department_name.clone(),
            status: p.status.map(Into::into),
            reports: p.reports.iter().map(Into::into).collect(),
        }
    }
}

pub(super) fn like_state(post_id: u64, state: ToggleState, pending: bool) -> ThanksLikeState {
    ThanksLikeState {
        post_id,
        liked: state.on,
        count: state.count,
        pending,
    }
}

/// Timeline row with the locally visible like state in place of the
/// server's snapshot.
pub(super) fn timeline_post(p: &TimelinePost, like: Option<ToggleState>) -> ThanksPost {
    let like = like.unwrap_or(ToggleState::new(p.liked_by_me, p.like_count));
    ThanksPost {
        id: p.id,
        content: p.content.clone(),
        created_at: p.created_at.clone(),
        mention_user_names: p.mention_user_names.clone(),
        mention_department_names: p.mention_department_names.clone(),
        liked: like.on,
        like_count: like.count,
    }
}
