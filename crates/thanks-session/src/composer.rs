//! Post and report composers: validation, payload assembly and the submit
//! round trip. The draft survives a failed submit and is discarded on success.

use tracing::{debug, debug_span, warn};

use thanks_core::draft::{Draft, DraftError, ReportDraft};
use thanks_core::model::PostId;

use crate::mention::MentionResolver;
use crate::types::{Completion, Generation, ReportRequest, SubmitRequest, Ticket};

pub struct PostComposer {
    draft: Draft,
    resolver: MentionResolver,
    error: Option<String>,
    submit_gen: Generation,
    in_flight: Option<Ticket>,
}

impl Default for PostComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PostComposer {
    pub fn new() -> Self {
        Self::with_parts(Draft::new(), MentionResolver::new())
    }

    pub fn with_parts(draft: Draft, resolver: MentionResolver) -> Self {
        Self {
            draft,
            resolver,
            error: None,
            submit_gen: Generation::default(),
            in_flight: None,
        }
    }

    /// Replace the body text. Returns `false` when input past the limit was dropped.
    pub fn set_content(&mut self, text: &str) -> bool {
        self.draft.set_content(text)
    }

    pub fn content(&self) -> &str {
        self.draft.content()
    }

    pub fn remaining(&self) -> usize {
        self.draft.remaining()
    }

    pub fn resolver(&self) -> &MentionResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut MentionResolver {
        &mut self.resolver
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Validate and build the submit request. `Ok(None)` while a previous
    /// submit is still in flight.
    pub fn prepare_submission(&mut self) -> Result<Option<SubmitRequest>, DraftError> {
        let _span = debug_span!("prepare_submission").entered();
        if self.in_flight.is_some() {
            debug!("submit already in flight");
            return Ok(None);
        }
        let payload = self
            .resolver
            .ensure_committed()
            .and_then(|()| self.draft.to_submission(self.resolver.committed()))
            .inspect_err(|err| self.error = Some(err.to_string()))?;
        self.error = None;
        let ticket = self.submit_gen.next();
        self.in_flight = Some(ticket);
        Ok(Some(SubmitRequest { ticket, payload }))
    }

    pub fn receive_submitted(&mut self, ticket: Ticket, result: Completion<()>) -> bool {
        if self.in_flight != Some(ticket) {
            debug!(?ticket, "dropping stale submit result");
            return false;
        }
        self.in_flight = None;
        match result {
            Ok(()) => self.discard(),
            Err(msg) => {
                warn!(%msg, "post submit failed");
                self.error = Some(msg);
            }
        }
        true
    }

    /// Drop the draft, e.g. when the compose dialog is closed.
    pub fn cancel(&mut self) {
        self.discard();
        self.submit_gen.invalidate();
        self.in_flight = None;
    }

    fn discard(&mut self) {
        self.draft.clear();
        self.resolver.clear();
        self.error = None;
    }
}

pub struct ReportComposer {
    draft: ReportDraft,
    error: Option<String>,
    submit_gen: Generation,
    in_flight: Option<Ticket>,
    sent: bool,
}

impl ReportComposer {
    pub fn new(post_id: PostId) -> Self {
        Self::with_draft(ReportDraft::new(post_id))
    }

    pub fn with_draft(draft: ReportDraft) -> Self {
        Self {
            draft,
            error: None,
            submit_gen: Generation::default(),
            in_flight: None,
            sent: false,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.draft.post_id()
    }

    pub fn set_reason(&mut self, text: &str) -> bool {
        self.draft.set_reason(text)
    }

    pub fn reason(&self) -> &str {
        self.draft.reason()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the server accepted the report.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    pub fn prepare(&mut self) -> Result<Option<ReportRequest>, DraftError> {
        if self.in_flight.is_some() || self.sent {
            return Ok(None);
        }
        let payload = self
            .draft
            .to_submission()
            .inspect_err(|err| self.error = Some(err.to_string()))?;
        self.error = None;
        let ticket = self.submit_gen.next();
        self.in_flight = Some(ticket);
        Ok(Some(ReportRequest { ticket, payload }))
    }

    pub fn receive_submitted(&mut self, ticket: Ticket, result: Completion<()>) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        match result {
            Ok(()) => self.sent = true,
            Err(msg) => {
                warn!(%msg, post_id = self.draft.post_id(), "report submit failed");
                self.error = Some(msg);
            }
        }
        true
    }
}
