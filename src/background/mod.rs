//! Bounded background queue for cache side effects.
//!
//! Cache population and invalidation never block or fail the operation that produced them.
//! Each worker drains its own bounded channel and jobs are routed by key, so jobs touching
//! the same key run in the order they were queued. When a channel is full the job is
//! dropped and logged, and the TTL bounds how long the skipped effect matters.


use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::answers::encode;
use crate::cache::{AnswerCache, RankCache};
use crate::hashing::shard_index;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_WORKERS: usize = 4;

/// A best-effort cache side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheJob {
    /// Write an encoded payload.
    Populate {
        key: String,
        bytes: Vec<u8>,
        ttl: Duration,
    },
    /// Delete every listed key.
    Invalidate { keys: Vec<String> },
}

impl CacheJob {
    /// Key that picks the worker: the written key, or the first key invalidated.
    fn route_key(&self) -> &str {
        match self {
            Self::Populate { key, .. } => key,
            Self::Invalidate { keys } => keys.first().map(String::as_str).unwrap_or_default(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Populate { .. } => "populate",
            Self::Invalidate { .. } => "invalidate",
        }
    }

    async fn run<C: AnswerCache>(self, cache: &RankCache<C>) {
        match self {
            Self::Populate { key, bytes, ttl } => {
                if cache.set_bytes(&key, bytes, ttl).await {
                    debug!(key = %key, "Cache populated");
                }
            }
            Self::Invalidate { keys } => {
                for key in &keys {
                    if !cache.delete(key).await {
                        warn!(key = %key, "Invalidation failed; entry expires by TTL");
                    }
                }
                debug!(keys = ?keys, "Cache invalidated");
            }
        }
    }
}

#[derive(Debug)]
struct Shared {
    /// One sender per worker; `None` once shut down.
    senders: Mutex<Option<Vec<mpsc::Sender<CacheJob>>>>,
    /// Accepted jobs not yet finished.
    pending: AtomicUsize,
    idle: Notify,
    workers: Mutex<Vec<JoinHandle<()>>>,
    dropped: AtomicUsize,
}

impl Shared {
    fn finish_one(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Handle to the maintenance queue. Clones share the same queue and workers.
#[derive(Debug, Clone)]
pub struct CacheMaintenance {
    shared: Arc<Shared>,
}

impl CacheMaintenance {
    /// Starts `workers` worker tasks sharing a budget of `capacity` queued jobs.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<C: AnswerCache>(cache: RankCache<C>, capacity: usize, workers: usize) -> Self {
        let workers = workers.max(1);
        let per_worker = capacity.div_ceil(workers).max(1);
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..workers).map(|_| mpsc::channel(per_worker)).unzip();

        let shared = Arc::new(Shared {
            senders: Mutex::new(Some(senders)),
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
            workers: Mutex::new(Vec::with_capacity(workers)),
            dropped: AtomicUsize::new(0),
        });

        let handles = receivers
            .into_iter()
            .enumerate()
            .map(|(worker, mut receiver)| {
                let shared = Arc::clone(&shared);
                let cache = cache.clone();
                tokio::spawn(async move {
                    while let Some(job) = receiver.recv().await {
                        job.run(&cache).await;
                        shared.finish_one();
                    }
                    debug!(worker, "Cache maintenance worker stopped");
                })
            })
            .collect();
        *shared.workers.lock() = handles;

        info!(capacity, workers, "Cache maintenance queue started");
        Self { shared }
    }

    /// Queues `job` without waiting. Returns `false` if it was dropped.
    pub fn enqueue(&self, job: CacheJob) -> bool {
        let guard = self.shared.senders.lock();
        let Some(senders) = guard.as_ref() else {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(job = job.kind(), "Cache maintenance stopped; job dropped");
            return false;
        };
        let sender = &senders[shard_index(job.route_key(), senders.len())];

        self.shared.pending.fetch_add(1, Ordering::AcqRel);
        match sender.try_send(job) {
            Ok(()) => true,
            Err(e) => {
                self.shared.finish_one();
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                let job = e.into_inner();
                warn!(
                    job = job.kind(),
                    key = job.route_key(),
                    "Cache maintenance queue full; job dropped"
                );
                false
            }
        }
    }

    /// Encodes `value` and queues a write of it under `key`.
    pub fn populate<T: Serialize>(&self, key: String, value: &T, ttl: Duration) -> bool {
        match encode(&key, value) {
            Ok(bytes) => self.enqueue(CacheJob::Populate { key, bytes, ttl }),
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping cache population");
                false
            }
        }
    }

    pub fn invalidate(&self, keys: Vec<String>) -> bool {
        self.enqueue(CacheJob::Invalidate { keys })
    }

    /// Jobs accepted but not yet finished.
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Jobs dropped since start.
    pub fn dropped(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Resolves once every accepted job has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stops accepting jobs, drains what is queued and waits for the workers to exit.
    pub async fn shutdown(&self) {
        drop(self.shared.senders.lock().take());
        let handles = std::mem::take(&mut *self.shared.workers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Cache maintenance worker panicked");
            }
        }
        info!(dropped = self.dropped(), "Cache maintenance queue drained");
    }
}
