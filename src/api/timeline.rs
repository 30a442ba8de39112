use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use thanks_core::model::{PostId, TimelinePost};
use thanks_session::{LikeBoard, ReportComposer, Ticket};

use crate::async_worker::{AsyncWorker, Job, Outcome};
use crate::transport::Feed;

use super::lock;
use super::types::{
    like_state, timeline_post, ThanksError, ThanksEvent, ThanksFeed, ThanksLikeState, ThanksPost,
};

struct TimelineState {
    posts: Vec<TimelinePost>,
    likes: LikeBoard,
    /// Open report dialogs by post.
    reports: HashMap<PostId, ReportComposer>,
    fetch_seq: u64,
    fetching: Option<Ticket>,
}

/// Timeline screen: post list, like buttons and the report dialog.
#[derive(uniffi::Object)]
pub struct ThanksTimeline {
    state: Mutex<TimelineState>,
    worker: AsyncWorker,
}

#[uniffi::export]
impl ThanksTimeline {
    pub fn refresh(&self, feed: ThanksFeed) -> Vec<ThanksEvent> {
        let mut state = lock(&self.state);
        state.fetch_seq += 1;
        let ticket = Ticket(state.fetch_seq);
        state.fetching = Some(ticket);
        self.worker.submit(Job::Timeline {
            ticket,
            feed: Feed::from(feed),
        });
        vec![ThanksEvent::SchedulePoll]
    }

    pub fn posts(&self) -> Vec<ThanksPost> {
        let state = lock(&self.state);
        state
            .posts
            .iter()
            .map(|p| timeline_post(p, state.likes.state(p.id)))
            .collect()
    }

    pub fn like_state(&self, post_id: u64) -> Option<ThanksLikeState> {
        let state = lock(&self.state);
        state
            .likes
            .state(post_id)
            .map(|s| like_state(post_id, s, state.likes.is_pending(post_id)))
    }

    /// Flip the like button. The new state is returned at once; a failed
    /// request later arrives through `poll` as a corrected `LikeChanged`.
    pub fn toggle_like(&self, post_id: u64) -> Vec<ThanksEvent> {
        let mut state = lock(&self.state);
        if let Some(req) = state.likes.toggle(post_id) {
            self.worker.submit(Job::Like(req));
        }
        let mut events = Vec::new();
        if let Some(s) = state.likes.state(post_id) {
            let pending = state.likes.is_pending(post_id);
            events.push(ThanksEvent::LikeChanged {
                state: like_state(post_id, s, pending),
            });
            if pending {
                events.push(ThanksEvent::SchedulePoll);
            }
        }
        events
    }

    pub fn report_post(&self, post_id: u64, reason: String) -> Result<Vec<ThanksEvent>, ThanksError> {
        let mut state = lock(&self.state);
        let composer = state
            .reports
            .entry(post_id)
            .or_insert_with(|| ReportComposer::new(post_id));
        composer.set_reason(&reason);
        match composer.prepare()? {
            Some(req) => {
                self.worker.submit(Job::Report(req));
                Ok(vec![ThanksEvent::SchedulePoll])
            }
            None => Ok(Vec::new()),
        }
    }

    pub fn poll(&self) -> Vec<ThanksEvent> {
        let outcomes = self.worker.drain();
        let mut events = Vec::new();
        let mut state = lock(&self.state);
        for outcome in outcomes {
            match outcome {
                Outcome::Timeline { ticket, result } => {
                    if state.fetching != Some(ticket) {
                        debug!(?ticket, "dropping stale timeline");
                        continue;
                    }
                    state.fetching = None;
                    match result {
                        Ok(posts) => {
                            state.likes.load_timeline(&posts);
                            state.posts = posts;
                            events.push(ThanksEvent::TimelineLoaded {
                                posts: state
                                    .posts
                                    .iter()
                                    .map(|p| timeline_post(p, state.likes.state(p.id)))
                                    .collect(),
                            });
                        }
                        Err(message) => events.push(ThanksEvent::ShowError { message }),
                    }
                }
                Outcome::Like {
                    post_id,
                    ticket,
                    result,
                } => {
                    if let Some(req) = state.likes.complete(post_id, ticket, result.is_ok()) {
                        self.worker.submit(Job::Like(req));
                    }
                    if let Err(message) = result {
                        events.push(ThanksEvent::ShowError { message });
                    }
                    if let Some(s) = state.likes.state(post_id) {
                        events.push(ThanksEvent::LikeChanged {
                            state: like_state(post_id, s, state.likes.is_pending(post_id)),
                        });
                    }
                }
                Outcome::Reported {
                    post_id,
                    ticket,
                    result,
                } => {
                    let Some(composer) = state.reports.get_mut(&post_id) else {
                        continue;
                    };
                    if !composer.receive_submitted(ticket, result) {
                        continue;
                    }
                    if composer.is_sent() {
                        state.reports.remove(&post_id);
                        events.push(ThanksEvent::ReportSent { post_id });
                    } else if let Some(message) = composer.error() {
                        events.push(ThanksEvent::ShowError {
                            message: message.to_string(),
                        });
                    }
                }
                _ => debug!("timeline ignoring unrelated outcome"),
            }
        }
        if self.worker.has_pending() {
            events.push(ThanksEvent::SchedulePoll);
        }
        events
    }
}

impl ThanksTimeline {
    pub(crate) fn create(worker: AsyncWorker) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(TimelineState {
                posts: Vec::new(),
                likes: LikeBoard::new(),
                reports: HashMap::new(),
                fetch_seq: 0,
                fetching: None,
            }),
            worker,
        })
    }
}
