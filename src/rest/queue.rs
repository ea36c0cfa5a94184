//! The request queue: rate-limit scheduling and asynchronous completion.
//!
//! Two tasks run per queue. The dispatcher walks the pending-request map,
//! executes whatever the per-endpoint buckets allow and pushes finished
//! pairs onto a completion queue; the completer drains that queue and
//! invokes the user callbacks. They are decoupled so slow callbacks do
//! not hold up dispatch and slow round-trips do not hold up callbacks for
//! requests that already finished. Wakeups travel over dedicated signal
//! channels, one token per event.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::cluster::RestConfig;
use crate::error::Result;
use crate::rest::request::{build_client, HttpError, HttpRequest, HttpRequestCompletion};
use crate::utils::now_secs;

/// Backoff between scheduling passes while an endpoint's window is closed.
const RATELIMIT_BACKOFF: Duration = Duration::from_millis(50);

/// A rate-limit window for one endpoint, rebuilt from every response.
#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    limit: u64,
    remaining: u64,
    reset_after: u64,
    retry_after: u64,
    /// Unix timestamp at which these counters were recorded.
    timestamp: u64,
}

impl Bucket {
    fn from_completion(result: &HttpRequestCompletion) -> Self {
        Self {
            limit: result.ratelimit_limit,
            remaining: result.ratelimit_remaining,
            reset_after: result.ratelimit_reset_after,
            retry_after: result.ratelimit_retry_after,
            timestamp: now_secs(),
        }
    }

    /// Seconds until the window may be tried again.
    fn wait(&self) -> u64 {
        if self.retry_after != 0 {
            self.retry_after
        } else {
            self.reset_after
        }
    }
}

type PendingMap = HashMap<String, Vec<Arc<HttpRequest>>>;
type ResponseQueue = VecDeque<(HttpRequestCompletion, Arc<HttpRequest>)>;

/// Marshals [`HttpRequest`]s against the per-endpoint and global
/// rate-limit windows advertised by the service. One of these lives in
/// each [`Cluster`](crate::cluster::Cluster).
pub struct RequestQueue {
    pending: Arc<Mutex<PendingMap>>,
    in_tx: UnboundedSender<()>,
    terminating: Arc<AtomicBool>,
    dispatcher: JoinHandle<()>,
    completer: JoinHandle<()>,
}

impl RequestQueue {
    /// Spawn the dispatcher and completer tasks. Must be called within a
    /// tokio runtime.
    pub fn new(config: Arc<RestConfig>) -> Result<Self> {
        let client = build_client(&config)?;
        let pending: Arc<Mutex<PendingMap>> = Arc::new(Mutex::new(HashMap::new()));
        let responses: Arc<Mutex<ResponseQueue>> = Arc::new(Mutex::new(VecDeque::new()));
        let terminating = Arc::new(AtomicBool::new(false));

        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher {
            config,
            client,
            pending: Arc::clone(&pending),
            responses: Arc::clone(&responses),
            buckets: HashMap::new(),
            globally_ratelimited: false,
            globally_limited_for: 0,
            terminating: Arc::clone(&terminating),
            in_tx: in_tx.clone(),
            in_rx,
            out_tx,
        };

        let dispatcher = tokio::spawn(dispatcher.run());
        let completer = tokio::spawn(complete_loop(responses, out_rx));

        Ok(Self {
            pending,
            in_tx,
            terminating,
            dispatcher,
            completer,
        })
    }

    /// Submit a request. Ownership moves to the queue; the completion
    /// handler fires exactly once, on the completer task. Never blocks,
    /// never fails.
    pub fn post_request(&self, req: HttpRequest) {
        let req = Arc::new(req);
        {
            let mut pending = self.pending.lock().unwrap();
            pending.entry(req.endpoint.clone()).or_default().push(req);
        }
        let _ = self.in_tx.send(());
    }

    /// Stop both workers. Requests that never reached the wire are
    /// completed with [`HttpError::Canceled`]; requests that did are
    /// delivered with their real results first.
    pub async fn shutdown(self) -> Result<()> {
        let RequestQueue {
            in_tx,
            terminating,
            dispatcher,
            completer,
            ..
        } = self;

        terminating.store(true, Ordering::Release);
        let _ = in_tx.send(());
        drop(in_tx);

        dispatcher.await?;
        // The dispatcher held the last completion-queue sender; the
        // completer drains and exits once that channel closes.
        completer.await?;
        tracing::debug!("request queue stopped");
        Ok(())
    }
}

struct Dispatcher {
    config: Arc<RestConfig>,
    client: reqwest::Client,
    pending: Arc<Mutex<PendingMap>>,
    responses: Arc<Mutex<ResponseQueue>>,
    /// Rate-limit counters per endpoint. Only this task touches them.
    buckets: HashMap<String, Bucket>,
    globally_ratelimited: bool,
    globally_limited_for: u64,
    terminating: Arc<AtomicBool>,
    in_tx: UnboundedSender<()>,
    in_rx: UnboundedReceiver<()>,
    out_tx: UnboundedSender<()>,
}

impl Dispatcher {
    async fn run(mut self) {
        while self.in_rx.recv().await.is_some() {
            if self.terminating.load(Ordering::Acquire) {
                break;
            }

            if self.globally_ratelimited {
                if self.globally_limited_for > 0 {
                    tracing::warn!(
                        seconds = self.globally_limited_for,
                        "globally rate limited, pausing all dispatch"
                    );
                    tokio::time::sleep(Duration::from_secs(self.globally_limited_for)).await;
                    self.globally_limited_for = 0;
                }
                self.globally_ratelimited = false;
                let _ = self.in_tx.send(());
                continue;
            }

            self.dispatch_pass().await;
            self.prune_completed();
        }

        self.cancel_pending();
    }

    /// One scheduling pass over a snapshot of the pending map. The
    /// snapshot is taken under the lock and iterated without it, so
    /// submitters never wait on network I/O.
    async fn dispatch_pass(&mut self) {
        let snapshot: PendingMap = {
            let pending = self.pending.lock().unwrap();
            pending.clone()
        };

        'endpoints: for (endpoint, queue) in &snapshot {
            for req in queue {
                if let Some(bucket) = self.buckets.get(endpoint) {
                    if bucket.remaining < 1 && now_secs() <= bucket.timestamp + bucket.wait() {
                        // Window still closed. Requests behind this one
                        // must not overtake it, and the whole pass backs
                        // off rather than racing the clock per endpoint.
                        tokio::time::sleep(RATELIMIT_BACKOFF).await;
                        let _ = self.in_tx.send(());
                        break 'endpoints;
                    }
                }

                let result = req.run(&self.client, &self.config).await;
                tracing::debug!(
                    endpoint = %endpoint,
                    status = result.status,
                    remaining = result.ratelimit_remaining,
                    "request dispatched"
                );
                let latched = self.record_bucket(endpoint, &result);

                {
                    let mut responses = self.responses.lock().unwrap();
                    responses.push_back((result, Arc::clone(req)));
                }
                let _ = self.out_tx.send(());

                if latched {
                    // A service-wide limit halts every endpoint, not just
                    // the rest of this one.
                    let _ = self.in_tx.send(());
                    break 'endpoints;
                }
            }
        }
    }

    /// Record the window advertised by a response, overwriting whatever
    /// was known for the endpoint. Returns true when the response latched
    /// the global limit.
    fn record_bucket(&mut self, endpoint: &str, result: &HttpRequestCompletion) -> bool {
        let bucket = Bucket::from_completion(result);
        let mut latched = false;
        if result.ratelimit_global {
            self.globally_ratelimited = true;
            self.globally_limited_for = bucket.wait();
            tracing::warn!(
                seconds = self.globally_limited_for,
                "service-wide rate limit advertised"
            );
            latched = true;
        }
        tracing::trace!(
            endpoint = %endpoint,
            limit = bucket.limit,
            remaining = bucket.remaining,
            reset_after = bucket.reset_after,
            "bucket updated"
        );
        self.buckets.insert(endpoint.to_string(), bucket);
        latched
    }

    /// Executed requests are pruned here, not at dispatch time, so the
    /// snapshot iteration never races the submitter's appends.
    fn prune_completed(&self) {
        let mut pending = self.pending.lock().unwrap();
        pending.retain(|_, queue| {
            queue.retain(|req| !req.is_completed());
            !queue.is_empty()
        });
    }

    /// Complete everything still pending with a cancellation record so
    /// the exactly-once handler guarantee holds across shutdown.
    fn cancel_pending(&mut self) {
        let drained: PendingMap = {
            let mut pending = self.pending.lock().unwrap();
            std::mem::take(&mut *pending)
        };

        for (endpoint, queue) in drained {
            for req in queue {
                if req.is_completed() {
                    // Executed; its real result is already queued.
                    continue;
                }
                tracing::debug!(endpoint = %endpoint, "cancelling pending request at shutdown");
                req.mark_completed();
                let result = HttpRequestCompletion {
                    error: HttpError::Canceled,
                    ..Default::default()
                };
                {
                    let mut responses = self.responses.lock().unwrap();
                    responses.push_back((result, req));
                }
                let _ = self.out_tx.send(());
            }
        }
    }
}

/// Completer task: one queued pair per signal token, popped under the
/// lock, delivered outside it. Exits once the signal channel closes and
/// drains any stragglers first.
async fn complete_loop(responses: Arc<Mutex<ResponseQueue>>, mut out_rx: UnboundedReceiver<()>) {
    while out_rx.recv().await.is_some() {
        deliver_one(&responses);
    }
    while deliver_one(&responses) {}
}

fn deliver_one(responses: &Mutex<ResponseQueue>) -> bool {
    let head = {
        let mut queue = responses.lock().unwrap();
        queue.pop_front()
    };
    match head {
        Some((result, req)) => {
            req.complete(&result);
            true
        }
        None => false,
    }
}
