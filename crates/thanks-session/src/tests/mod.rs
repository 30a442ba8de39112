mod likes;
mod moderation;
mod proptest_toggle;

use thanks_core::model::{AdminPostRecord, Candidate, MentionKind, ReportRecord};
use thanks_core::moderation::ReportStatus;

use crate::mention::{MentionResolver, ResolverLimits};

pub(super) fn limits() -> ResolverLimits {
    ResolverLimits {
        min_query_chars: 2,
        max_candidates: 20,
        max_mentions: 3,
    }
}

pub(super) fn make_resolver() -> MentionResolver {
    MentionResolver::with_limits(limits())
}

pub(super) fn user(id: u64, name: &str) -> Candidate {
    Candidate {
        id,
        name: name.to_string(),
        kind: MentionKind::User,
        extra_label: None,
    }
}

pub(super) fn dept(id: u64, name: &str) -> Candidate {
    Candidate {
        id,
        name: name.to_string(),
        kind: MentionKind::Department,
        extra_label: None,
    }
}

pub(super) fn report(id: u64, reporter: &str, status: ReportStatus) -> ReportRecord {
    ReportRecord {
        id,
        reporter_user_id: Some(100 + id),
        reporter_name: Some(reporter.to_string()),
        reason: "spam".to_string(),
        status,
    }
}

pub(super) fn post(id: u64, content: &str, created_at: &str, reports: Vec<ReportRecord>) -> AdminPostRecord {
    AdminPostRecord {
        id,
        content: content.to_string(),
        created_at: created_at.to_string(),
        author_name: Some("Sato".to_string()),
        department_name: None,
        mention_user_ids: Vec::new(),
        reports,
    }
}
