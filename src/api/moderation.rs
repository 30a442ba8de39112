use std::sync::{Arc, Mutex};

use tracing::debug;

use thanks_core::moderation::ReportStatus;
use thanks_session::{confirm_prompt, AlwaysConfirm, ModerationBoard, ViewId};

use crate::async_worker::{AsyncWorker, Job, Outcome};

use super::lock;
use super::types::{ThanksAdminPost, ThanksError, ThanksEvent, ThanksReportStatus, ThanksViewScope};

/// Implemented by the native UI to show a yes/no dialog.
#[uniffi::export(with_foreign)]
pub trait ThanksConfirm: Send + Sync {
    fn confirm(&self, prompt: String) -> bool;
}

/// Admin screens: any number of post lists over one report table.
#[derive(uniffi::Object)]
pub struct ThanksModeration {
    board: Mutex<ModerationBoard>,
    worker: AsyncWorker,
}

#[uniffi::export]
impl ThanksModeration {
    /// Open a list and start loading it. Returns its view id.
    pub fn open_view(&self, scope: ThanksViewScope) -> u32 {
        let (view, req) = lock(&self.board).open_view(scope.into());
        self.worker.submit(Job::View(req));
        view.0
    }

    pub fn refresh(&self, view_id: u32) -> Result<(), ThanksError> {
        let req = lock(&self.board).refresh(ViewId(view_id))?;
        self.worker.submit(Job::View(req));
        Ok(())
    }

    pub fn close_view(&self, view_id: u32) -> bool {
        lock(&self.board).close_view(ViewId(view_id))
    }

    /// Posts of a view matching the search box, newest first.
    pub fn posts(&self, view_id: u32, query: String) -> Vec<ThanksAdminPost> {
        lock(&self.board)
            .filtered(ViewId(view_id), &query)
            .into_iter()
            .map(Into::into)
            .collect()
    }

    pub fn status_of(&self, post_id: u64) -> Option<ThanksReportStatus> {
        lock(&self.board).status_of(post_id).map(Into::into)
    }

    /// Change a report's status after asking `confirmer`. Returns whether a
    /// request was sent; the lists change only once the server accepts it.
    pub fn apply_status(
        &self,
        report_id: u64,
        status: ThanksReportStatus,
        confirmer: Arc<dyn ThanksConfirm>,
    ) -> Result<bool, ThanksError> {
        let status = ReportStatus::from(status);
        if !lock(&self.board).check_status(report_id, status)? {
            return Ok(false);
        }
        // The dialog may run on the thread that polls, so it must not be
        // shown while the board is locked.
        if !confirmer.confirm(confirm_prompt(status)) {
            debug!(report_id, "status change declined");
            return Ok(false);
        }
        let req = lock(&self.board).apply_status(report_id, status, &AlwaysConfirm)?;
        let sent = req.is_some();
        if let Some(req) = req {
            self.worker.submit(Job::Status(req));
        }
        Ok(sent)
    }

    pub fn poll(&self) -> Vec<ThanksEvent> {
        let outcomes = self.worker.drain();
        let mut events = Vec::new();
        let mut board = lock(&self.board);
        let mut changed = false;
        for outcome in outcomes {
            let accepted = match outcome {
                Outcome::View {
                    view,
                    ticket,
                    result,
                } => board.receive_view(view, ticket, result),
                Outcome::Status { ticket, result } => board.receive_status(ticket, result),
                _ => {
                    debug!("moderation ignoring unrelated outcome");
                    false
                }
            };
            changed |= accepted;
            if accepted {
                if let Some(message) = board.error() {
                    events.push(ThanksEvent::ShowError {
                        message: message.to_string(),
                    });
                    board.clear_error();
                }
            }
        }
        if changed {
            for view in board.view_ids() {
                if let Some(projection) = board.view(view).filter(|p| p.is_loaded()) {
                    events.push(ThanksEvent::ViewChanged {
                        view_id: view.0,
                        posts: projection.posts().iter().map(Into::into).collect(),
                    });
                }
            }
        }
        if self.worker.has_pending() {
            events.push(ThanksEvent::SchedulePoll);
        }
        events
    }
}

impl ThanksModeration {
    pub(crate) fn create(worker: AsyncWorker) -> Arc<Self> {
        Arc::new(Self {
            board: Mutex::new(ModerationBoard::new()),
            worker,
        })
    }
}
