//! Draft post and report validation.
//!
//! `Draft` holds the post body and `MentionSet` the committed mentions until
//! the post is submitted. Limits come from `settings()` unless a caller
//! supplies its own.

use crate::model::{MentionKind, MentionRef, PostId, PostSubmission, ReportSubmission};
use crate::settings::settings;
use crate::unicode::{char_len, truncate_chars};

/// Local validation failures. Never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("message is empty")]
    EmptyContent,
    #[error("message is {len} characters; the limit is {max}")]
    ContentTooLong { len: usize, max: usize },
    #[error("pick a mention from the candidate list")]
    UncommittedMention,
    #[error("at most {0} mentions are allowed")]
    TooManyMentions(usize),
    #[error("{0} is already mentioned")]
    DuplicateMention(String),
    #[error("report reason is empty")]
    EmptyReason,
    #[error("report reason is {len} characters; the limit is {max}")]
    ReasonTooLong { len: usize, max: usize },
}

/// Bounded set of mentions with unique `(kind, id)` keys, in selection order.
#[derive(Debug, Clone)]
pub struct MentionSet {
    refs: Vec<MentionRef>,
    max: usize,
}

impl MentionSet {
    pub fn new(max: usize) -> Self {
        Self {
            refs: Vec::new(),
            max,
        }
    }

    /// Add a mention. The set is left untouched on error.
    pub fn insert(&mut self, mention: MentionRef) -> Result<(), DraftError> {
        if self.contains(mention.kind, mention.id) {
            return Err(DraftError::DuplicateMention(mention.display_name));
        }
        if self.is_full() {
            return Err(DraftError::TooManyMentions(self.max));
        }
        self.refs.push(mention);
        Ok(())
    }

    /// Remove by key. Returns `true` if something was removed.
    pub fn remove(&mut self, kind: MentionKind, id: u64) -> bool {
        let before = self.refs.len();
        self.refs.retain(|r| r.key() != (kind, id));
        self.refs.len() < before
    }

    pub fn contains(&self, kind: MentionKind, id: u64) -> bool {
        self.refs.iter().any(|r| r.key() == (kind, id))
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.refs.len() >= self.max
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn as_slice(&self) -> &[MentionRef] {
        &self.refs
    }

    pub fn clear(&mut self) {
        self.refs.clear();
    }

    fn ids_of(&self, kind: MentionKind) -> Vec<u64> {
        self.refs
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.id)
            .collect()
    }

    pub fn user_ids(&self) -> Vec<u64> {
        self.ids_of(MentionKind::User)
    }

    pub fn department_ids(&self) -> Vec<u64> {
        self.ids_of(MentionKind::Department)
    }
}

/// Post body. The committed mentions are owned by the mention resolver and
/// joined with the body only when the payload is built.
#[derive(Debug, Clone)]
pub struct Draft {
    content: String,
    max_content: usize,
}

impl Default for Draft {
    fn default() -> Self {
        Self::new()
    }
}

impl Draft {
    pub fn new() -> Self {
        Self::with_limit(settings().draft.max_content_chars)
    }

    pub fn with_limit(max_content: usize) -> Self {
        Self {
            content: String::new(),
            max_content,
        }
    }

    /// Replace the body. Input past the limit is dropped; returns `false`
    /// when anything was cut.
    pub fn set_content(&mut self, text: &str) -> bool {
        let kept = truncate_chars(text, self.max_content);
        let accepted = kept.len() == text.len();
        self.content = kept.to_string();
        accepted
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn remaining(&self) -> usize {
        self.max_content.saturating_sub(char_len(&self.content))
    }

    pub fn validate(&self, mentions: &MentionSet) -> Result<(), DraftError> {
        if self.content.trim().is_empty() {
            return Err(DraftError::EmptyContent);
        }
        let len = char_len(&self.content);
        if len > self.max_content {
            return Err(DraftError::ContentTooLong {
                len,
                max: self.max_content,
            });
        }
        if mentions.len() > mentions.max() {
            return Err(DraftError::TooManyMentions(mentions.max()));
        }
        Ok(())
    }

    /// Flatten body and mentions into the wire payload.
    pub fn to_submission(&self, mentions: &MentionSet) -> Result<PostSubmission, DraftError> {
        self.validate(mentions)?;
        Ok(PostSubmission {
            content: self.content.clone(),
            mention_user_ids: mentions.user_ids(),
            mention_department_ids: mentions.department_ids(),
        })
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }
}

/// Reason text for reporting a post.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    post_id: PostId,
    reason: String,
    max_reason: usize,
}

impl ReportDraft {
    pub fn new(post_id: PostId) -> Self {
        Self::with_limit(post_id, settings().report.max_reason_chars)
    }

    pub fn with_limit(post_id: PostId, max_reason: usize) -> Self {
        Self {
            post_id,
            reason: String::new(),
            max_reason,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn set_reason(&mut self, text: &str) -> bool {
        let kept = truncate_chars(text, self.max_reason);
        let accepted = kept.len() == text.len();
        self.reason = kept.to_string();
        accepted
    }

    pub fn to_submission(&self) -> Result<ReportSubmission, DraftError> {
        if self.reason.trim().is_empty() {
            return Err(DraftError::EmptyReason);
        }
        let len = char_len(&self.reason);
        if len > self.max_reason {
            return Err(DraftError::ReasonTooLong {
                len,
                max: self.max_reason,
            });
        }
        Ok(ReportSubmission {
            reported_post_id: self.post_id,
            reason: self.reason.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, name: &str) -> MentionRef {
        MentionRef {
            id,
            display_name: name.to_string(),
            kind: MentionKind::User,
        }
    }

    fn dept(id: u64, name: &str) -> MentionRef {
        MentionRef {
            id,
            display_name: name.to_string(),
            kind: MentionKind::Department,
        }
    }

    #[test]
    fn test_content_limit_rejects_141st_char() {
        let mut draft = Draft::with_limit(140);
        assert!(draft.set_content(&"a".repeat(140)));
        assert_eq!(draft.remaining(), 0);
        assert!(!draft.set_content(&"a".repeat(141)));
        assert_eq!(char_len(draft.content()), 140);
        assert!(draft.validate(&MentionSet::new(3)).is_ok());
    }

    #[test]
    fn test_content_limit_counts_chars_not_bytes() {
        let mut draft = Draft::with_limit(5);
        assert!(draft.set_content("ありがとう"));
        assert!(!draft.set_content("ありがとう!"));
        assert_eq!(draft.content(), "ありがとう");
    }

    #[test]
    fn test_empty_content_rejected() {
        let mentions = MentionSet::new(3);
        let mut draft = Draft::with_limit(140);
        assert_eq!(draft.validate(&mentions), Err(DraftError::EmptyContent));
        draft.set_content("  \n ");
        assert_eq!(draft.to_submission(&mentions), Err(DraftError::EmptyContent));
    }

    #[test]
    fn test_mention_set_rejects_duplicates() {
        let mut set = MentionSet::new(3);
        set.insert(user(1, "Sato")).unwrap();
        assert_eq!(
            set.insert(user(1, "Sato")),
            Err(DraftError::DuplicateMention("Sato".to_string()))
        );
        assert_eq!(set.len(), 1);
        // Same id, different kind is a different mention
        set.insert(dept(1, "営業部")).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_mention_set_capacity() {
        let mut set = MentionSet::new(3);
        for id in 1..=3 {
            set.insert(user(id, "u")).unwrap();
        }
        assert!(set.is_full());
        assert_eq!(set.insert(user(4, "u")), Err(DraftError::TooManyMentions(3)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_mention_remove() {
        let mut set = MentionSet::new(3);
        set.insert(user(1, "Sato")).unwrap();
        assert!(!set.remove(MentionKind::Department, 1));
        assert!(set.remove(MentionKind::User, 1));
        assert!(set.is_empty());
    }

    #[test]
    fn test_submission_flattens_mentions() {
        let mut draft = Draft::with_limit(140);
        draft.set_content("いつもありがとう");
        let mut mentions = MentionSet::new(3);
        mentions.insert(user(5, "Sato")).unwrap();
        mentions.insert(dept(2, "営業部")).unwrap();
        mentions.insert(user(9, "Tanaka")).unwrap();
        let payload = draft.to_submission(&mentions).unwrap();
        assert_eq!(payload.content, "いつもありがとう");
        assert_eq!(payload.mention_user_ids, vec![5, 9]);
        assert_eq!(payload.mention_department_ids, vec![2]);
    }

    #[test]
    fn test_report_draft() {
        let mut report = ReportDraft::with_limit(42, 10);
        assert_eq!(report.to_submission(), Err(DraftError::EmptyReason));
        assert!(!report.set_reason("inappropriate"));
        assert_eq!(report.reason(), "inappropri");
        let payload = report.to_submission().unwrap();
        assert_eq!(payload.reported_post_id, 42);
    }
}
