use std::time::Duration;

use crate::background::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
use crate::constants::{ENTITY_TTL, LEADERBOARD_TTL, RANK_TTL};
use crate::lock::KeyedLocks;

/// Default deadline for a single score store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);
/// Default deadline for a single answer cache call.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// Tunables for [`super::RankService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// TTL of cached entity records.
    pub entity_ttl: Duration,
    /// TTL of cached ranks.
    pub rank_ttl: Duration,
    /// TTL of the leaderboard listing cache.
    pub leaderboard_ttl: Duration,
    /// Deadline applied to each score store call.
    pub store_timeout: Duration,
    /// Deadline applied to each answer cache call.
    pub cache_timeout: Duration,
    /// Shards in the per-id lock table.
    pub lock_shards: usize,
    /// Capacity of the cache maintenance queue.
    pub queue_capacity: usize,
    /// Workers draining the cache maintenance queue.
    pub queue_workers: usize,
    /// Resolve ties split across a page boundary with a point count.
    pub exact_page_boundaries: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            entity_ttl: ENTITY_TTL,
            rank_ttl: RANK_TTL,
            leaderboard_ttl: LEADERBOARD_TTL,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            lock_shards: KeyedLocks::DEFAULT_SHARDS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            queue_workers: DEFAULT_WORKERS,
            exact_page_boundaries: true,
        }
    }
}
