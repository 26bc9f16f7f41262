//! In-memory answer cache with call counters and fault injection, for tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::AnswerCache;
use super::error::{CacheError, CacheResult};

#[derive(Debug, Default)]
struct Inner {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
    gets: AtomicUsize,
    hits: AtomicUsize,
    sets: AtomicUsize,
    deletes: AtomicUsize,
    latency_ms: AtomicU64,
    failing: AtomicBool,
}

/// TTL-respecting [`AnswerCache`] that records how it was used.
///
/// Expiry follows `tokio::time`, so tests running with a paused clock can advance past TTLs.
#[derive(Debug, Clone, Default)]
pub struct MockAnswerCache {
    inner: Arc<Inner>,
}

impl MockAnswerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied to every operation.
    pub fn set_latency(&self, latency: Duration) {
        self.inner
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Makes every operation fail with [`CacheError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.inner.gets.load(Ordering::SeqCst)
    }

    pub fn hits(&self) -> usize {
        self.inner.hits.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.inner.sets.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.inner.deletes.load(Ordering::SeqCst)
    }

    /// Returns `true` if `key` holds a live value. Not counted.
    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .entries
            .lock()
            .get(key)
            .is_some_and(|(_, expires_at)| *expires_at > Instant::now())
    }

    /// Remaining time to live of `key`, if live. Not counted.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.inner
            .entries
            .lock()
            .get(key)
            .and_then(|(_, expires_at)| expires_at.checked_duration_since(now))
            .filter(|remaining| !remaining.is_zero())
    }

    /// Live keys starting with `prefix`, sorted. Not counted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .inner
            .entries
            .lock()
            .iter()
            .filter(|(key, (_, expires_at))| key.starts_with(prefix) && *expires_at > now)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .entries
            .lock()
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn enter(&self, counter: &AtomicUsize) -> CacheResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        let ms = self.inner.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable {
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl AnswerCache for MockAnswerCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.enter(&self.inner.gets).await?;
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        match entries.get(key) {
            Some((bytes, expires_at)) if *expires_at > now => {
                self.inner.hits.fetch_add(1, Ordering::SeqCst);
                Ok(Some(bytes.clone()))
            }
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.enter(&self.inner.sets).await?;
        self.inner
            .entries
            .lock()
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.enter(&self.inner.deletes).await?;
        self.inner.entries.lock().remove(key);
        Ok(())
    }
}
