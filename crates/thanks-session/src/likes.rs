//! Like state for every post shown in a timeline, one optimistic toggle each.

use std::collections::HashMap;

use tracing::debug;

use thanks_core::model::{PostId, TimelinePost};

use crate::toggle::{OptimisticToggle, ToggleState};
use crate::types::{LikeRequest, Ticket, ToggleRequest};

#[derive(Default)]
pub struct LikeBoard {
    posts: HashMap<PostId, OptimisticToggle>,
}

impl LikeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)initialise from a server snapshot. Posts with a request in flight
    /// keep their local state; posts missing from the snapshot are dropped
    /// unless they are pending. Returns how many posts were skipped.
    pub fn load<I>(&mut self, snapshot: I) -> usize
    where
        I: IntoIterator<Item = (PostId, ToggleState)>,
    {
        let mut seen = Vec::new();
        let mut skipped = 0;
        for (post_id, state) in snapshot {
            seen.push(post_id);
            match self.posts.get_mut(&post_id) {
                Some(toggle) => {
                    if !toggle.reset(state) {
                        debug!(post_id, "like in flight; snapshot skipped");
                        skipped += 1;
                    }
                }
                None => {
                    self.posts.insert(post_id, OptimisticToggle::new(state));
                }
            }
        }
        self.posts
            .retain(|id, toggle| toggle.is_pending() || seen.contains(id));
        skipped
    }

    pub fn load_timeline(&mut self, posts: &[TimelinePost]) -> usize {
        self.load(
            posts
                .iter()
                .map(|p| (p.id, ToggleState::new(p.liked_by_me, p.like_count))),
        )
    }

    pub fn state(&self, post_id: PostId) -> Option<ToggleState> {
        self.posts.get(&post_id).map(OptimisticToggle::state)
    }

    pub fn is_pending(&self, post_id: PostId) -> bool {
        self.posts
            .get(&post_id)
            .is_some_and(OptimisticToggle::is_pending)
    }

    /// Click on a post's like button. Unknown posts are ignored.
    pub fn toggle(&mut self, post_id: PostId) -> Option<LikeRequest> {
        let Some(toggle) = self.posts.get_mut(&post_id) else {
            debug!(post_id, "like on unknown post");
            return None;
        };
        toggle.toggle().map(|req| like_request(post_id, req))
    }

    pub fn complete(&mut self, post_id: PostId, ticket: Ticket, ok: bool) -> Option<LikeRequest> {
        self.posts
            .get_mut(&post_id)?
            .complete(ticket, ok)
            .map(|req| like_request(post_id, req))
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

fn like_request(post_id: PostId, req: ToggleRequest) -> LikeRequest {
    LikeRequest {
        post_id,
        ticket: req.ticket,
        liked: req.on,
    }
}
