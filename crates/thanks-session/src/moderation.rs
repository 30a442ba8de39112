//! Moderation board: the session's authoritative report table plus every
//! open admin list projected from it.
//!
//! Status changes are not optimistic. A confirmed change is sent first and
//! applied on success in one step: the report, its post's effective status
//! and the membership of every loaded view move together, so no view ever
//! shows a post under a status another view has already left behind.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, debug_span, info, warn};

use thanks_core::model::{AdminPostRecord, PostId, ReportId, UserId};
use thanks_core::moderation::{effective_status, Report, ReportStatus, TransitionError, ViewScope};
use thanks_core::unicode::{contains_normalized, normalize};

use crate::confirm::Confirm;
use crate::types::{Completion, Generation, StatusRequest, Ticket, ViewId, ViewRequest};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModerationError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("unknown report {0}")]
    UnknownReport(ReportId),
    #[error("report {0} already has an update in flight")]
    UpdateInFlight(ReportId),
    #[error("unknown view {0:?}")]
    UnknownView(ViewId),
}

/// Post fields that do not depend on moderation state.
#[derive(Debug, Clone)]
struct PostMeta {
    content: String,
    created_at: String,
    author_name: Option<String>,
    department_name: Option<String>,
    mention_user_ids: Vec<UserId>,
    report_ids: Vec<ReportId>,
}

/// A post as one view renders it. Rebuilt from the report table after
/// every change, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostProjection {
    pub id: PostId,
    pub content: String,
    pub created_at: String,
    pub author_name: Option<String>,
    pub department_name: Option<String>,
    pub mention_user_ids: Vec<UserId>,
    pub reports: Vec<Report>,
    pub status: Option<ReportStatus>,
}

#[derive(Debug)]
pub struct ViewProjection {
    scope: ViewScope,
    loaded: bool,
    fetching: Option<Ticket>,
    posts: Vec<PostProjection>,
}

impl ViewProjection {
    pub fn scope(&self) -> ViewScope {
        self.scope
    }

    /// Whether at least one fetch has landed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.is_some()
    }

    /// Newest first.
    pub fn posts(&self) -> &[PostProjection] {
        &self.posts
    }

    pub fn contains(&self, post_id: PostId) -> bool {
        self.posts.iter().any(|p| p.id == post_id)
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingUpdate {
    ticket: Ticket,
    status: ReportStatus,
}

#[derive(Default)]
pub struct ModerationBoard {
    posts: HashMap<PostId, PostMeta>,
    reports: HashMap<ReportId, Report>,
    views: BTreeMap<ViewId, ViewProjection>,
    next_view: u32,
    updates: HashMap<ReportId, PendingUpdate>,
    fetch_gen: Generation,
    update_gen: Generation,
    error: Option<String>,
}

impl ModerationBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn view(&self, view: ViewId) -> Option<&ViewProjection> {
        self.views.get(&view)
    }

    pub fn view_ids(&self) -> Vec<ViewId> {
        self.views.keys().copied().collect()
    }

    pub fn report(&self, report_id: ReportId) -> Option<&Report> {
        self.reports.get(&report_id)
    }

    /// Effective status from the authoritative table.
    pub fn status_of(&self, post_id: PostId) -> Option<ReportStatus> {
        self.posts
            .get(&post_id)
            .and_then(|meta| self.effective(meta))
    }

    pub fn is_updating(&self, report_id: ReportId) -> bool {
        self.updates.contains_key(&report_id)
    }

    /// Register a view and return the fetch that fills it.
    pub fn open_view(&mut self, scope: ViewScope) -> (ViewId, ViewRequest) {
        self.next_view += 1;
        let view = ViewId(self.next_view);
        let ticket = self.fetch_gen.next();
        self.views.insert(
            view,
            ViewProjection {
                scope,
                loaded: false,
                fetching: Some(ticket),
                posts: Vec::new(),
            },
        );
        debug!(?view, scope = scope.as_str(), "view opened");
        (view, ViewRequest { view, ticket, scope })
    }

    pub fn close_view(&mut self, view: ViewId) -> bool {
        self.views.remove(&view).is_some()
    }

    /// Refetch a view. A newer fetch supersedes one still in flight.
    pub fn refresh(&mut self, view: ViewId) -> Result<ViewRequest, ModerationError> {
        let ticket = self.fetch_gen.next();
        let projection = self
            .views
            .get_mut(&view)
            .ok_or(ModerationError::UnknownView(view))?;
        projection.fetching = Some(ticket);
        Ok(ViewRequest {
            view,
            ticket,
            scope: projection.scope,
        })
    }

    /// Deliver a view fetch. Reports already resolved locally stay resolved
    /// whatever the fetch says. Returns `false` for a stale ticket.
    pub fn receive_view(
        &mut self,
        view: ViewId,
        ticket: Ticket,
        result: Completion<Vec<AdminPostRecord>>,
    ) -> bool {
        let _span = debug_span!("receive_view", ?view).entered();
        match self.views.get_mut(&view) {
            Some(p) if p.fetching == Some(ticket) => p.fetching = None,
            _ => {
                debug!(?ticket, "dropping stale view fetch");
                return false;
            }
        }
        let records = match result {
            Ok(records) => records,
            Err(msg) => {
                warn!(%msg, "view fetch failed");
                self.error = Some(msg);
                return true;
            }
        };

        let fetched: Vec<PostId> = records.iter().map(|r| r.id).collect();
        for record in records {
            self.merge(record);
        }

        let Some(scope) = self.views.get(&view).map(ViewProjection::scope) else {
            return true;
        };
        let posts = fetched
            .iter()
            .filter_map(|&id| self.project(id))
            .filter(|p| scope.includes(p.status))
            .collect();
        if let Some(projection) = self.views.get_mut(&view) {
            projection.posts = posts;
            projection.loaded = true;
            sort_newest_first(&mut projection.posts);
        }
        // The fetch may carry news for posts other views already show.
        for id in fetched {
            self.propagate(id, Some(view));
        }
        true
    }

    /// Ask for a report status change. Nothing changes locally until the
    /// server accepts it. `Ok(None)` when there is nothing to send: the
    /// change is a no-op or the confirmer declined.
    pub fn apply_status(
        &mut self,
        report_id: ReportId,
        status: ReportStatus,
        confirm: &dyn Confirm,
    ) -> Result<Option<StatusRequest>, ModerationError> {
        let _span = debug_span!("apply_status", report_id, status = status.as_str()).entered();
        let changes = self
            .check_status(report_id, status)
            .inspect_err(|err| self.error = Some(err.to_string()))?;
        if !changes {
            debug!("status unchanged");
            return Ok(None);
        }
        if !confirm.confirm(&confirm_prompt(status)) {
            debug!("declined");
            return Ok(None);
        }
        self.error = None;
        let ticket = self.update_gen.next();
        self.updates
            .insert(report_id, PendingUpdate { ticket, status });
        Ok(Some(StatusRequest {
            ticket,
            report_id,
            status,
        }))
    }

    /// Settle a status update. On success the report, its post and every
    /// loaded view change together; on failure nothing changes.
    pub fn receive_status(&mut self, ticket: Ticket, result: Completion<()>) -> bool {
        let Some((&report_id, &update)) = self
            .updates
            .iter()
            .find(|(_, pending)| pending.ticket == ticket)
        else {
            debug!(?ticket, "dropping stale status result");
            return false;
        };
        self.updates.remove(&report_id);

        if let Err(msg) = result {
            warn!(%msg, report_id, "status update failed");
            self.error = Some(msg);
            return true;
        }
        let Some(report) = self.reports.get_mut(&report_id) else {
            return true;
        };
        // A refresh may have seen the report resolved by someone else while
        // this update was in flight; terminal states stay put.
        match report.status.transition(update.status) {
            Ok(status) if status != report.status => {
                report.status = status;
                let post_id = report.post_id;
                info!(report_id, post_id, status = status.as_str(), "report resolved");
                self.propagate(post_id, None);
            }
            Ok(_) => {}
            Err(err) => debug!(%err, report_id, "keeping status resolved elsewhere"),
        }
        true
    }

    /// Validate a status change without sending it. `Ok(false)` when the
    /// report already has that status.
    pub fn check_status(&self, report_id: ReportId, status: ReportStatus) -> Result<bool, ModerationError> {
        let report = self
            .reports
            .get(&report_id)
            .ok_or(ModerationError::UnknownReport(report_id))?;
        if self.updates.contains_key(&report_id) {
            return Err(ModerationError::UpdateInFlight(report_id));
        }
        report.status.transition(status)?;
        Ok(report.status != status)
    }

    /// Posts of a view whose content or any reporter name contains the query.
    /// An empty query matches everything.
    pub fn filtered(&self, view: ViewId, query: &str) -> Vec<&PostProjection> {
        let Some(projection) = self.views.get(&view) else {
            return Vec::new();
        };
        let query = normalize(query);
        projection
            .posts
            .iter()
            .filter(|p| {
                query.is_empty()
                    || contains_normalized(&p.content, &query)
                    || p.reports.iter().any(|r| {
                        r.reporter_name
                            .as_deref()
                            .is_some_and(|name| contains_normalized(name, &query))
                    })
            })
            .collect()
    }

    fn merge(&mut self, record: AdminPostRecord) {
        let post_id = record.id;
        let mut report_ids = self
            .posts
            .get(&post_id)
            .map(|meta| meta.report_ids.clone())
            .unwrap_or_default();
        for fetched in record.reports {
            let fetched = Report::from_record(post_id, fetched);
            if !report_ids.contains(&fetched.id) {
                report_ids.push(fetched.id);
            }
            match self.reports.get_mut(&fetched.id) {
                Some(known) => {
                    let status = known.status.reconcile(fetched.status);
                    if status != fetched.status {
                        debug!(report_id = fetched.id, "fetch behind local state");
                    }
                    *known = Report { status, ..fetched };
                }
                None => {
                    self.reports.insert(fetched.id, fetched);
                }
            }
        }
        self.posts.insert(
            post_id,
            PostMeta {
                content: record.content,
                created_at: record.created_at,
                author_name: record.author_name,
                department_name: record.department_name,
                mention_user_ids: record.mention_user_ids,
                report_ids,
            },
        );
    }

    fn effective(&self, meta: &PostMeta) -> Option<ReportStatus> {
        effective_status(
            meta.report_ids
                .iter()
                .filter_map(|id| self.reports.get(id))
                .map(|r| r.status),
        )
    }

    fn project(&self, post_id: PostId) -> Option<PostProjection> {
        let meta = self.posts.get(&post_id)?;
        let reports = meta
            .report_ids
            .iter()
            .filter_map(|id| self.reports.get(id))
            .cloned()
            .collect();
        Some(PostProjection {
            id: post_id,
            content: meta.content.clone(),
            created_at: meta.created_at.clone(),
            author_name: meta.author_name.clone(),
            department_name: meta.department_name.clone(),
            mention_user_ids: meta.mention_user_ids.clone(),
            reports,
            status: self.effective(meta),
        })
    }

    /// Bring every loaded view (except `skip`) in line with the table for
    /// one post: drop it where its scope no longer applies, refresh it where
    /// it stays, insert it where it now belongs.
    fn propagate(&mut self, post_id: PostId, skip: Option<ViewId>) {
        let Some(fresh) = self.project(post_id) else {
            return;
        };
        for (&id, view) in self.views.iter_mut() {
            if Some(id) == skip || !view.loaded {
                continue;
            }
            let position = view.posts.iter().position(|p| p.id == post_id);
            match (position, view.scope.includes(fresh.status)) {
                (Some(i), true) => view.posts[i] = fresh.clone(),
                (Some(i), false) => {
                    debug!(view = ?id, post_id, "post left view");
                    view.posts.remove(i);
                }
                (None, true) => {
                    debug!(view = ?id, post_id, "post joined view");
                    view.posts.push(fresh.clone());
                    sort_newest_first(&mut view.posts);
                }
                (None, false) => {}
            }
        }
    }
}

/// Question put to the confirmer before a status change is sent.
pub fn confirm_prompt(status: ReportStatus) -> String {
    format!("Change status to {status}?")
}

fn sort_newest_first(posts: &mut [PostProjection]) {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
