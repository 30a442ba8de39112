use std::sync::{Arc, Mutex};

use tracing::debug;

use thanks_core::model::{Candidate, MentionKind};
use thanks_session::{InputEvent, LookupRequest, PostComposer};

use crate::async_worker::{AsyncWorker, Job, Outcome};

use super::lock;
use super::types::{ThanksCandidate, ThanksEvent, ThanksInputEvent, ThanksMentionKind};

/// Compose dialog: body text, mention search and submission.
#[derive(uniffi::Object)]
pub struct ThanksComposer {
    composer: Mutex<PostComposer>,
    worker: AsyncWorker,
}

#[uniffi::export]
impl ThanksComposer {
    /// Returns `false` when input past the length limit was dropped.
    pub fn set_content(&self, text: String) -> bool {
        lock(&self.composer).set_content(&text)
    }

    pub fn content(&self) -> String {
        lock(&self.composer).content().to_string()
    }

    pub fn remaining(&self) -> u32 {
        u32::try_from(lock(&self.composer).remaining()).unwrap_or(u32::MAX)
    }

    pub fn set_mention_kind(&self, kind: ThanksMentionKind) -> Vec<ThanksEvent> {
        self.worker.invalidate_search();
        let mut composer = lock(&self.composer);
        let req = composer.resolver_mut().set_kind(kind.into());
        self.finish(&composer, req)
    }

    pub fn input(&self, event: ThanksInputEvent) -> Vec<ThanksEvent> {
        let event = match event {
            ThanksInputEvent::CompositionStart => InputEvent::CompositionStart,
            ThanksInputEvent::CompositionUpdate { text } => InputEvent::CompositionUpdate(text),
            ThanksInputEvent::CompositionEnd { text } => InputEvent::CompositionEnd(text),
            ThanksInputEvent::Text { text } => InputEvent::Text(text),
            ThanksInputEvent::Commit => InputEvent::Commit,
        };
        let mut composer = lock(&self.composer);
        let before = composer.resolver().query().to_string();
        // A rejected Enter lands in the resolver's error slot.
        let req = composer.resolver_mut().handle_input(event).ok().flatten();
        // A new user search supersedes the queued one by itself; a query
        // that was cut short or is answered locally must drop it.
        let requeried = composer.resolver().query() != before;
        if requeried && !matches!(req, Some(LookupRequest::Users { .. })) {
            self.worker.invalidate_search();
        }
        self.finish(&composer, req)
    }

    pub fn select(&self, candidate: ThanksCandidate) -> Vec<ThanksEvent> {
        self.worker.invalidate_search();
        let mut composer = lock(&self.composer);
        composer.resolver_mut().select(&Candidate::from(candidate));
        self.finish(&composer, None)
    }

    pub fn deselect(&self, kind: ThanksMentionKind, id: u64) -> Vec<ThanksEvent> {
        let mut composer = lock(&self.composer);
        composer.resolver_mut().deselect(MentionKind::from(kind), id);
        self.finish(&composer, None)
    }

    pub fn submit(&self) -> Vec<ThanksEvent> {
        let mut composer = lock(&self.composer);
        if let Ok(Some(req)) = composer.prepare_submission() {
            self.worker.submit(Job::Submit(req));
        }
        self.finish(&composer, None)
    }

    /// Close the dialog and drop the draft.
    pub fn cancel(&self) {
        self.worker.invalidate_search();
        lock(&self.composer).cancel();
    }

    pub fn poll(&self) -> Vec<ThanksEvent> {
        let outcomes = self.worker.drain();
        let mut events = Vec::new();
        if outcomes.is_empty() {
            if self.worker.has_pending() {
                events.push(ThanksEvent::SchedulePoll);
            }
            return events;
        }

        let mut composer = lock(&self.composer);
        let mut changed = false;
        for outcome in outcomes {
            match outcome {
                Outcome::Users { ticket, result } => {
                    changed |= composer.resolver_mut().receive_candidates(ticket, result);
                }
                Outcome::Departments { ticket, result } => {
                    changed |= composer.resolver_mut().receive_departments(ticket, result);
                }
                Outcome::Submitted { ticket, result } => {
                    let ok = result.is_ok();
                    if composer.receive_submitted(ticket, result) {
                        changed = true;
                        if ok {
                            events.push(ThanksEvent::Submitted);
                        }
                    }
                }
                _ => debug!("composer ignoring unrelated outcome"),
            }
        }
        if changed {
            events.extend(snapshot(&composer));
        }
        if self.worker.has_pending() {
            events.push(ThanksEvent::SchedulePoll);
        }
        events
    }
}

impl ThanksComposer {
    pub(crate) fn create(worker: AsyncWorker) -> Arc<Self> {
        Arc::new(Self {
            composer: Mutex::new(PostComposer::new()),
            worker,
        })
    }

    /// Dispatch a lookup, then report the resolver's visible state.
    fn finish(&self, composer: &PostComposer, req: Option<LookupRequest>) -> Vec<ThanksEvent> {
        let dispatched = req.is_some();
        match req {
            Some(LookupRequest::Users { ticket, query }) => self.worker.submit_search(ticket, query),
            Some(LookupRequest::Departments { ticket }) => {
                self.worker.submit(Job::Departments(ticket))
            }
            None => {}
        }
        let mut events = snapshot(composer);
        if dispatched || self.worker.has_pending() {
            events.push(ThanksEvent::SchedulePoll);
        }
        events
    }
}

fn snapshot(composer: &PostComposer) -> Vec<ThanksEvent> {
    let resolver = composer.resolver();
    let error = match composer.error().or(resolver.error()) {
        Some(message) => ThanksEvent::ShowError {
            message: message.to_string(),
        },
        None => ThanksEvent::ClearError,
    };
    vec![
        ThanksEvent::ShowCandidates {
            candidates: resolver.candidates().iter().map(Into::into).collect(),
        },
        ThanksEvent::MentionsChanged {
            mentions: resolver.mentions().iter().map(Into::into).collect(),
        },
        error,
    ]
}
