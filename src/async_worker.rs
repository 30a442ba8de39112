use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, debug_span, warn};

use thanks_core::model::{AdminPostRecord, Candidate, PostId, TimelinePost};
use thanks_session::{
    Completion, LikeRequest, ReportRequest, StatusRequest, SubmitRequest, Ticket, ViewId,
    ViewRequest,
};

use crate::transport::{Feed, Transport, TransportError};

// ---------------------------------------------------------------------------
// Work / Result types
// ---------------------------------------------------------------------------

struct SearchWork {
    ticket: Ticket,
    query: String,
    generation: u64,
}

/// Requests that are never superseded and run in submission order.
pub(crate) enum Job {
    Departments(Ticket),
    Like(LikeRequest),
    Status(StatusRequest),
    View(ViewRequest),
    Submit(SubmitRequest),
    Report(ReportRequest),
    Timeline { ticket: Ticket, feed: Feed },
}

pub(crate) enum Outcome {
    Users {
        ticket: Ticket,
        result: Completion<Vec<Candidate>>,
    },
    Departments {
        ticket: Ticket,
        result: Completion<Vec<Candidate>>,
    },
    Like {
        post_id: PostId,
        ticket: Ticket,
        result: Completion<()>,
    },
    Status {
        ticket: Ticket,
        result: Completion<()>,
    },
    View {
        view: ViewId,
        ticket: Ticket,
        result: Completion<Vec<AdminPostRecord>>,
    },
    Submitted {
        ticket: Ticket,
        result: Completion<()>,
    },
    Reported {
        post_id: PostId,
        ticket: Ticket,
        result: Completion<()>,
    },
    Timeline {
        ticket: Ticket,
        result: Completion<Vec<TimelinePost>>,
    },
}

fn completion<T>(result: Result<T, TransportError>) -> Completion<T> {
    result.map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// AsyncWorker
// ---------------------------------------------------------------------------

pub(crate) struct AsyncWorker {
    search_tx: mpsc::Sender<SearchWork>,
    search_gen: Arc<AtomicU64>,
    job_tx: mpsc::Sender<Job>,
    outcome_rx: Mutex<mpsc::Receiver<Outcome>>,
    /// Work items submitted but not yet finished or skipped.
    pending: Arc<AtomicUsize>,
}

impl AsyncWorker {
    pub fn new(transport: Arc<dyn Transport>, debounce: Duration) -> io::Result<Self> {
        let search_gen = Arc::new(AtomicU64::new(0));
        let pending = Arc::new(AtomicUsize::new(0));
        let (outcome_tx, outcome_rx) = mpsc::channel::<Outcome>();

        let (search_tx, search_rx) = mpsc::channel::<SearchWork>();
        {
            let transport = Arc::clone(&transport);
            let gen = Arc::clone(&search_gen);
            let tx = outcome_tx.clone();
            let pending = Arc::clone(&pending);
            thread::Builder::new()
                .name("thanks-search".into())
                .spawn(move || search_worker(search_rx, tx, gen, pending, transport, debounce))?;
        }

        let (job_tx, job_rx) = mpsc::channel::<Job>();
        {
            let pending = Arc::clone(&pending);
            thread::Builder::new()
                .name("thanks-requests".into())
                .spawn(move || job_worker(job_rx, outcome_tx, pending, transport))?;
        }

        Ok(Self {
            search_tx,
            search_gen,
            job_tx,
            outcome_rx: Mutex::new(outcome_rx),
            pending,
        })
    }

    /// Queue a user search. Any search queued or running before it becomes
    /// stale.
    pub fn submit_search(&self, ticket: Ticket, query: String) {
        let generation = self.search_gen.fetch_add(1, Ordering::SeqCst) + 1;
        let work = SearchWork {
            ticket,
            query,
            generation,
        };
        send_counted(&self.search_tx, &self.pending, work);
    }

    pub fn invalidate_search(&self) {
        self.search_gen.fetch_add(1, Ordering::SeqCst);
    }

    pub fn submit(&self, job: Job) {
        send_counted(&self.job_tx, &self.pending, job);
    }

    /// Whether a later `poll` may still have something to deliver.
    pub fn has_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    pub fn try_recv(&self) -> Option<Outcome> {
        let rx = self.outcome_rx.lock().ok()?;
        rx.try_recv().ok()
    }

    /// Everything finished so far, in completion order.
    pub fn drain(&self) -> Vec<Outcome> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Outcome> {
        let rx = self.outcome_rx.lock().ok()?;
        rx.recv_timeout(timeout).ok()
    }
}

// ---------------------------------------------------------------------------
// Worker threads
// ---------------------------------------------------------------------------

/// Send `item` to a worker thread, counting it as pending only while it can
/// still produce an outcome.
fn send_counted<T>(tx: &mpsc::Sender<T>, pending: &AtomicUsize, item: T) {
    pending.fetch_add(1, Ordering::SeqCst);
    if tx.send(item).is_err() {
        pending.fetch_sub(1, Ordering::SeqCst);
        warn!("worker thread gone; request dropped");
    }
}

fn search_worker(
    rx: mpsc::Receiver<SearchWork>,
    tx: mpsc::Sender<Outcome>,
    gen: Arc<AtomicU64>,
    pending: Arc<AtomicUsize>,
    transport: Arc<dyn Transport>,
    debounce: Duration,
) {
    while let Ok(work) = rx.recv() {
        // Drain: if multiple work items queued, skip to latest
        let mut latest = work;
        let mut taken = 1;
        while let Ok(newer) = rx.try_recv() {
            latest = newer;
            taken += 1;
        }

        // Debounce, then check the user has stopped typing
        thread::sleep(debounce);
        if latest.generation != gen.load(Ordering::SeqCst) {
            pending.fetch_sub(taken, Ordering::SeqCst);
            continue;
        }

        let _span = debug_span!("search", query = %latest.query).entered();
        let result = transport
            .search_users(&latest.query)
            .map(|users| users.into_iter().map(Candidate::from).collect());

        // A newer query may have arrived during the request
        if latest.generation == gen.load(Ordering::SeqCst) {
            let _ = tx.send(Outcome::Users {
                ticket: latest.ticket,
                result: completion(result),
            });
        } else {
            debug!("search superseded in flight");
        }
        // Decrement after sending so a poll never sees zero pending while
        // the outcome is still on its way.
        pending.fetch_sub(taken, Ordering::SeqCst);
    }
}

fn job_worker(
    rx: mpsc::Receiver<Job>,
    tx: mpsc::Sender<Outcome>,
    pending: Arc<AtomicUsize>,
    transport: Arc<dyn Transport>,
) {
    while let Ok(job) = rx.recv() {
        let outcome = match job {
            Job::Departments(ticket) => Outcome::Departments {
                ticket,
                result: completion(
                    transport
                        .list_departments()
                        .map(|list| list.into_iter().map(Candidate::from).collect()),
                ),
            },
            Job::Like(req) => Outcome::Like {
                post_id: req.post_id,
                ticket: req.ticket,
                result: completion(transport.set_like(req.post_id, req.liked)),
            },
            Job::Status(req) => Outcome::Status {
                ticket: req.ticket,
                result: completion(transport.update_report_status(req.report_id, req.status)),
            },
            Job::View(req) => Outcome::View {
                view: req.view,
                ticket: req.ticket,
                result: completion(transport.admin_posts(req.scope)),
            },
            Job::Submit(req) => Outcome::Submitted {
                ticket: req.ticket,
                result: completion(transport.create_post(&req.payload)),
            },
            Job::Report(req) => Outcome::Reported {
                post_id: req.payload.reported_post_id,
                ticket: req.ticket,
                result: completion(transport.report_post(&req.payload)),
            },
            Job::Timeline { ticket, feed } => Outcome::Timeline {
                ticket,
                result: completion(transport.timeline(feed)),
            },
        };
        let sent = tx.send(outcome);
        pending.fetch_sub(1, Ordering::SeqCst);
        if sent.is_err() {
            break;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::FakeTransport;
    use super::*;

    use thanks_core::model::UserRecord;

    fn fake_with_users() -> Arc<FakeTransport> {
        Arc::new(FakeTransport {
            users: vec![
                UserRecord {
                    id: 1,
                    name: "タナカ".into(),
                    department_id: None,
                    department_name: None,
                },
                UserRecord {
                    id: 2,
                    name: "Sato".into(),
                    department_id: None,
                    department_name: None,
                },
            ],
            ..Default::default()
        })
    }

    #[test]
    fn test_send_to_stopped_worker_is_not_pending() {
        let (tx, rx) = mpsc::channel::<u32>();
        drop(rx);
        let pending = AtomicUsize::new(0);
        send_counted(&tx, &pending, 1);
        assert_eq!(pending.load(Ordering::SeqCst), 0);

        let (tx, _rx) = mpsc::channel::<u32>();
        send_counted(&tx, &pending, 1);
        assert_eq!(pending.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_burst_of_searches_runs_only_latest() {
        let fake = fake_with_users();
        let worker = AsyncWorker::new(fake.clone(), Duration::from_millis(50)).unwrap();
        for (i, q) in ["t", "ta", "たな", "たなか"].into_iter().enumerate() {
            worker.submit_search(Ticket(i as u64 + 1), q.to_string());
        }
        let Some(Outcome::Users { ticket, result }) = worker.recv_timeout(Duration::from_secs(5)) else {
            panic!("expected search outcome");
        };
        assert_eq!(ticket, Ticket(4));
        assert_eq!(result.unwrap()[0].id, 1);
        assert_eq!(*fake.search_calls.lock().unwrap(), vec!["たなか".to_string()]);
    }

    #[test]
    fn test_invalidated_search_produces_nothing() {
        let fake = fake_with_users();
        let worker = AsyncWorker::new(fake.clone(), Duration::from_millis(100)).unwrap();
        worker.submit_search(Ticket(1), "sa".into());
        worker.invalidate_search();
        assert!(worker.recv_timeout(Duration::from_millis(400)).is_none());
        assert!(fake.search_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_write_becomes_message() {
        let fake = Arc::new(FakeTransport::default());
        fake.fail_writes.store(true, Ordering::SeqCst);
        let worker = AsyncWorker::new(fake, Duration::ZERO).unwrap();
        worker.submit(Job::Like(LikeRequest {
            post_id: 7,
            ticket: Ticket(1),
            liked: true,
        }));
        let Some(Outcome::Like { post_id, result, .. }) = worker.recv_timeout(Duration::from_secs(5)) else {
            panic!("expected like outcome");
        };
        assert_eq!(post_id, 7);
        assert_eq!(result, Err("server returned HTTP 500".to_string()));
    }
}
