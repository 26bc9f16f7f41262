//! Score store: the source of truth for entities and their scores.
//!
//! The rank service only ever talks to a store through [`ScoreStore`]. Ranks are derived
//! from [`ScoreStore::count_greater_than`], so a backend must answer it from an index rather
//! than a scan.

pub mod error;
mod index;
pub mod memory;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod seed;
pub mod snapshot;


use std::future::Future;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryScoreStore;
#[cfg(any(test, feature = "mock"))]
pub use mock::CountingScoreStore;
pub use seed::seed_demo;
pub use snapshot::{EntityRecord, SnapshotFile};

use crate::model::Entity;

/// Durable table of entities keyed by id.
pub trait ScoreStore: Send + Sync + 'static {
    /// Looks up an entity by id.
    fn get_by_id(&self, id: &str) -> impl Future<Output = StoreResult<Option<Entity>>> + Send;

    /// Looks up an entity by name, case-insensitively.
    fn get_by_name(&self, name: &str)
    -> impl Future<Output = StoreResult<Option<Entity>>> + Send;

    /// Inserts a new entity. Fails on a duplicate id or name.
    fn insert(&self, entity: Entity) -> impl Future<Output = StoreResult<()>> + Send;

    /// Durably sets `score` for `id`. Returns the updated entity, or `None` if absent.
    fn update_score(
        &self,
        id: &str,
        score: i32,
    ) -> impl Future<Output = StoreResult<Option<Entity>>> + Send;

    /// Counts entities with a score strictly greater than `score`.
    fn count_greater_than(&self, score: i32) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Returns up to `limit` entities starting at `offset`, ordered by `(score desc, name asc)`.
    fn page(&self, offset: u64, limit: u64)
    -> impl Future<Output = StoreResult<Vec<Entity>>> + Send;

    /// Counts all entities.
    fn count_all(&self) -> impl Future<Output = StoreResult<u64>> + Send;
}
