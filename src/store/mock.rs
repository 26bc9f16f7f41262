//! Instrumented store wrapper for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::error::{StoreError, StoreResult};
use super::memory::MemoryScoreStore;
use super::ScoreStore;
use crate::model::Entity;

#[derive(Debug, Default)]
struct Counters {
    get_by_id: AtomicUsize,
    get_by_name: AtomicUsize,
    insert: AtomicUsize,
    update_score: AtomicUsize,
    count_greater_than: AtomicUsize,
    page: AtomicUsize,
    count_all: AtomicUsize,
    latency_ms: AtomicU64,
    write_latency_ms: AtomicU64,
    failing: AtomicBool,
}

/// Wraps a store, counting calls per operation.
///
/// Read paths can be slowed down with [`CountingScoreStore::set_latency`] and every
/// operation can be made to fail with [`CountingScoreStore::set_failing`].
#[derive(Debug, Clone, Default)]
pub struct CountingScoreStore<S = MemoryScoreStore> {
    inner: S,
    counters: Arc<Counters>,
}

impl CountingScoreStore<MemoryScoreStore> {
    pub fn new() -> Self {
        Self::wrap(MemoryScoreStore::new())
    }
}

impl<S> CountingScoreStore<S> {
    pub fn wrap(inner: S) -> Self {
        Self {
            inner,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Delay applied to `get_by_id`, `count_greater_than` and `page`.
    pub fn set_latency(&self, latency: Duration) {
        self.counters
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Delay applied to `insert` and `update_score` before they reach the inner store.
    pub fn set_write_latency(&self, latency: Duration) {
        self.counters
            .write_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.counters.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get_by_id_calls(&self) -> usize {
        self.counters.get_by_id.load(Ordering::SeqCst)
    }

    pub fn get_by_name_calls(&self) -> usize {
        self.counters.get_by_name.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.counters.insert.load(Ordering::SeqCst)
    }

    pub fn update_score_calls(&self) -> usize {
        self.counters.update_score.load(Ordering::SeqCst)
    }

    pub fn count_greater_than_calls(&self) -> usize {
        self.counters.count_greater_than.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> usize {
        self.counters.page.load(Ordering::SeqCst)
    }

    pub fn count_all_calls(&self) -> usize {
        self.counters.count_all.load(Ordering::SeqCst)
    }

    /// Sum of all read calls.
    pub fn total_reads(&self) -> usize {
        self.get_by_id_calls()
            + self.get_by_name_calls()
            + self.count_greater_than_calls()
            + self.page_calls()
            + self.count_all_calls()
    }

    pub fn reset_counts(&self) {
        for counter in [
            &self.counters.get_by_id,
            &self.counters.get_by_name,
            &self.counters.insert,
            &self.counters.update_score,
            &self.counters.count_greater_than,
            &self.counters.page,
            &self.counters.count_all,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }

    fn enter(&self, counter: &AtomicUsize) -> StoreResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.counters.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }

    async fn delay(&self) {
        sleep_ms(&self.counters.latency_ms).await;
    }

    async fn write_delay(&self) {
        sleep_ms(&self.counters.write_latency_ms).await;
    }
}

async fn sleep_ms(setting: &AtomicU64) {
    let ms = setting.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

impl<S: ScoreStore> ScoreStore for CountingScoreStore<S> {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Entity>> {
        self.enter(&self.counters.get_by_id)?;
        self.delay().await;
        self.inner.get_by_id(id).await
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<Option<Entity>> {
        self.enter(&self.counters.get_by_name)?;
        self.inner.get_by_name(name).await
    }

    async fn insert(&self, entity: Entity) -> StoreResult<()> {
        self.enter(&self.counters.insert)?;
        self.write_delay().await;
        self.inner.insert(entity).await
    }

    async fn update_score(&self, id: &str, score: i32) -> StoreResult<Option<Entity>> {
        self.enter(&self.counters.update_score)?;
        self.write_delay().await;
        self.inner.update_score(id, score).await
    }

    async fn count_greater_than(&self, score: i32) -> StoreResult<u64> {
        self.enter(&self.counters.count_greater_than)?;
        self.delay().await;
        self.inner.count_greater_than(score).await
    }

    async fn page(&self, offset: u64, limit: u64) -> StoreResult<Vec<Entity>> {
        self.enter(&self.counters.page)?;
        self.delay().await;
        self.inner.page(offset, limit).await
    }

    async fn count_all(&self) -> StoreResult<u64> {
        self.enter(&self.counters.count_all)?;
        self.inner.count_all().await
    }
}
