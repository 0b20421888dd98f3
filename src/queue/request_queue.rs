//! Request Queue
//!
//! Serial, paced execution of producer futures. Exactly one producer runs at a
//! time, in arrival order, each preceded by the pacing delay.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};
use crate::lock::mutex_lock;

const SOURCE: &str = "queue::request_queue";

/// Hands a finished producer's outcome to its caller.
type Deliver = Box<dyn FnOnce() + Send>;

/// Deferred producer; resolves to whether it succeeded and how to deliver
/// the outcome once the queue has recorded it.
type Job = Box<dyn FnOnce() -> BoxFuture<'static, (bool, Deliver)> + Send>;

struct QueueEntry {
    key: Option<String>,
    token: Option<CancellationToken>,
    job: Job,
}

// == Queue Stats ==
/// Counters for the diagnostics surface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueStats {
    /// Entries ever appended
    pub enqueued: u64,
    /// Producers that resolved successfully
    pub completed: u64,
    /// Producers that returned an error or panicked
    pub failed: u64,
    /// Entries removed or skipped before they started
    pub cancelled: u64,
    /// Entries waiting to run
    pub pending: usize,
    /// Whether the processing loop is active
    pub running: bool,
}

#[derive(Default)]
struct QueueState {
    entries: VecDeque<QueueEntry>,
    running: bool,
    /// Key of the entry between dequeue and completion
    current: Option<String>,
    stats: QueueStats,
}

struct Inner {
    state: Mutex<QueueState>,
    pacing: Duration,
}

// == Request Queue ==
/// Globally serial request queue with per-key cancellation.
///
/// Cloning is cheap; clones share the same queue. Enqueueing requires a
/// running Tokio runtime because the processing loop is spawned on demand.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<Inner>,
}

impl RequestQueue {
    // == Constructor ==
    /// Creates an idle queue that waits `pacing` before each producer runs.
    pub fn new(pacing: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                pacing,
            }),
        }
    }

    // == Enqueue ==
    /// Appends a producer and returns a future for its own outcome.
    ///
    /// The entry is appended before this function returns, so queue order is
    /// call order even if the returned future is polled later. A producer error
    /// or panic rejects only this caller.
    pub fn enqueue<T, F, Fut>(
        &self,
        key: Option<&str>,
        producer: F,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.enqueue_with_token(key, None, producer)
    }

    /// Like [`enqueue`](Self::enqueue), but the entry is skipped if `token` is
    /// cancelled before it starts.
    pub fn enqueue_with_token<T, F, Fut>(
        &self,
        key: Option<&str>,
        token: Option<CancellationToken>,
        producer: F,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let label = key.unwrap_or("<unkeyed>").to_string();
        let (tx, rx) = oneshot::channel::<Result<T>>();

        let job_label = label.clone();
        let job: Job = Box::new(move || {
            async move {
                let outcome = AssertUnwindSafe(async move { producer().await })
                    .catch_unwind()
                    .await;
                let result = match outcome {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => {
                        debug!(key = %job_label, error = %err, "queued producer failed");
                        Err(CacheError::Producer(err))
                    }
                    Err(_) => {
                        warn!(key = %job_label, "queued producer panicked");
                        Err(CacheError::Panicked(job_label))
                    }
                };
                let succeeded = result.is_ok();
                let deliver: Deliver = Box::new(move || {
                    // The caller may have stopped waiting; the outcome is dropped then.
                    let _ = tx.send(result);
                });
                (succeeded, deliver)
            }
            .boxed()
        });

        self.push(QueueEntry {
            key: key.map(str::to_owned),
            token,
            job,
        });

        async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(CacheError::Cancelled(label)),
            }
        }
    }

    fn push(&self, entry: QueueEntry) {
        let start_loop = {
            let mut state = mutex_lock(&self.inner.state, SOURCE, "push");
            debug!(key = ?entry.key, pending = state.entries.len(), "request enqueued");
            state.entries.push_back(entry);
            state.stats.enqueued += 1;
            if state.running {
                false
            } else {
                state.running = true;
                true
            }
        };

        if start_loop {
            tokio::spawn(Self::process(Arc::clone(&self.inner)));
        }
    }

    // == Processing Loop ==
    async fn process(inner: Arc<Inner>) {
        while let Some(entry) = Self::next_entry(&inner) {
            tokio::time::sleep(inner.pacing).await;

            if entry.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
                debug!(key = ?entry.key, "request cancelled during pacing delay");
                let mut state = mutex_lock(&inner.state, SOURCE, "process");
                state.current = None;
                state.stats.cancelled += 1;
                continue;
            }

            let (succeeded, deliver) = (entry.job)().await;

            {
                let mut state = mutex_lock(&inner.state, SOURCE, "process");
                state.current = None;
                if succeeded {
                    state.stats.completed += 1;
                } else {
                    state.stats.failed += 1;
                }
            }
            // Counters are settled before the caller wakes.
            deliver();
        }
        debug!("request queue drained");
    }

    /// Pops the next runnable entry and marks it current, or flips the queue
    /// back to idle when nothing is left.
    fn next_entry(inner: &Inner) -> Option<QueueEntry> {
        let mut state = mutex_lock(&inner.state, SOURCE, "next_entry");
        while let Some(entry) = state.entries.pop_front() {
            if entry.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
                debug!(key = ?entry.key, "skipping cancelled request");
                state.stats.cancelled += 1;
                continue;
            }
            state.current = entry.key.clone();
            return Some(entry);
        }
        state.running = false;
        state.current = None;
        None
    }

    // == Cancel ==
    /// Removes the first queued entry with `key`.
    ///
    /// Returns `false` if `key` belongs to the entry currently running or if no
    /// queued entry matches. The removed producer never runs and its caller
    /// receives [`CacheError::Cancelled`].
    pub fn cancel(&self, key: &str) -> bool {
        let removed = {
            let mut state = mutex_lock(&self.inner.state, SOURCE, "cancel");
            if state.current.as_deref() == Some(key) {
                debug!(key, "refusing to cancel in-flight request");
                return false;
            }
            let position = state
                .entries
                .iter()
                .position(|entry| entry.key.as_deref() == Some(key));
            match position {
                Some(index) => {
                    state.stats.cancelled += 1;
                    state.entries.remove(index)
                }
                None => None,
            }
        };

        match removed {
            Some(_) => {
                debug!(key, "queued request cancelled");
                true
            }
            None => false,
        }
    }

    /// Number of entries waiting to run.
    pub fn len(&self) -> usize {
        mutex_lock(&self.inner.state, SOURCE, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the processing loop is active.
    pub fn is_running(&self) -> bool {
        mutex_lock(&self.inner.state, SOURCE, "is_running").running
    }

    pub fn stats(&self) -> QueueStats {
        let state = mutex_lock(&self.inner.state, SOURCE, "stats");
        QueueStats {
            pending: state.entries.len(),
            running: state.running,
            ..state.stats.clone()
        }
    }
}
