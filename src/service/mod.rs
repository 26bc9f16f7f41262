//! Rank service: tie-aware ranks and leaderboard pages over a score store.
//!
//! Reads go cache first. A rank miss takes the id's lock from [`KeyedLocks`], re-reads
//! the cache and only then asks the store, so concurrent misses for one id cost a single
//! computation. Score updates write through to the store and leave cache invalidation to
//! [`CacheMaintenance`].

pub mod config;
pub mod error;
pub mod leaderboard;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

pub use config::{DEFAULT_CACHE_TIMEOUT, DEFAULT_STORE_TIMEOUT, ServiceConfig};
pub use error::{RankError, RankResult};

use crate::background::CacheMaintenance;
use crate::cache::keys::{entity_key, invalidated_by_score_change, leaderboard_page_key};
use crate::cache::{AnswerCache, RankCache};
use crate::constants::LEADERBOARD_KEY;
use crate::lock::KeyedLocks;
use crate::model::{Entity, LeaderboardPage, RankedEntity};
use crate::store::{ScoreStore, StoreError, StoreResult};
use crate::validation::{
    validate_context_size, validate_id, validate_name, validate_page, validate_score,
};

use leaderboard::{assign_ranks, has_more, page_offset, window_around};

/// Rank and leaderboard queries over a [`ScoreStore`], cached in an [`AnswerCache`].
///
/// Must be created inside a Tokio runtime: construction starts the cache maintenance workers.
pub struct RankService<S, C> {
    store: Arc<S>,
    cache: RankCache<C>,
    locks: KeyedLocks,
    maintenance: CacheMaintenance,
    config: ServiceConfig,
}

impl<S: ScoreStore, C: AnswerCache> RankService<S, C> {
    pub fn new(store: Arc<S>, cache: Arc<C>, config: ServiceConfig) -> Self {
        let cache = RankCache::new(cache, config.cache_timeout);
        let maintenance =
            CacheMaintenance::start(cache.clone(), config.queue_capacity, config.queue_workers);
        Self {
            store,
            cache,
            locks: KeyedLocks::new(config.lock_shards),
            maintenance,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &RankCache<C> {
        &self.cache
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn maintenance(&self) -> &CacheMaintenance {
        &self.maintenance
    }

    /// Number of ids with a rank computation in flight or waited on.
    pub fn ranks_in_flight(&self) -> usize {
        self.locks.in_flight()
    }

    async fn call_store<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> RankResult<T> {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!(operation, error = %e, "Score store call failed");
                Err(e.into())
            }
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.config.store_timeout.as_millis() as u64,
                    "Score store call timed out"
                );
                Err(RankError::Timeout { operation })
            }
        }
    }

    async fn load(&self, id: &str) -> RankResult<Entity> {
        self.call_store("get_by_id", self.store.get_by_id(id))
            .await?
            .ok_or_else(|| RankError::not_found(id))
    }

    /// Returns an entity with its current rank.
    #[instrument(skip(self))]
    pub async fn record(&self, id: &str) -> RankResult<RankedEntity> {
        validate_id(id)?;

        let entity = match self.cache.entity(id).await {
            Some(entity) => entity,
            None => {
                let entity = self.load(id).await?;
                self.maintenance
                    .populate(entity_key(id), &entity, self.config.entity_ttl);
                entity
            }
        };

        let rank = self.rank(id).await?;
        Ok(RankedEntity { entity, rank })
    }

    /// Returns `1 + |{entities with a strictly greater score}|`.
    ///
    /// At most one store computation per id is in flight; concurrent callers for the same
    /// id wait for it and read its cached result.
    #[instrument(skip(self))]
    pub async fn rank(&self, id: &str) -> RankResult<u64> {
        validate_id(id)?;

        if let Some(rank) = self.cache.rank(id).await {
            debug!(rank, "Rank cache hit");
            return Ok(rank);
        }

        let _guard = self.locks.lock(id).await;

        if let Some(rank) = self.cache.rank(id).await {
            debug!(rank, "Rank filled while waiting");
            return Ok(rank);
        }

        let entity = self.load(id).await?;
        let above = self
            .call_store("count_greater_than", self.store.count_greater_than(entity.score))
            .await?;
        let rank = above + 1;

        // Written before the lock is released so waiters find it.
        self.cache.store_rank(id, rank, self.config.rank_ttl).await;
        debug!(rank, score = entity.score, "Rank computed");
        Ok(rank)
    }

    /// Durably sets a new score and returns the entity with its rank.
    ///
    /// Cache invalidation is queued, not awaited: a concurrent reader may still see the
    /// previous rank until it runs or the rank TTL elapses. A write that times out keeps
    /// running and is still followed by an invalidation.
    #[instrument(skip(self))]
    pub async fn update_score(&self, id: &str, score: i32) -> RankResult<RankedEntity> {
        validate_id(id)?;
        validate_score(score)?;

        let previous = self.load(id).await?;
        let entity = self
            .call_store("update_score", self.write_score(id, score))
            .await?
            .ok_or_else(|| RankError::not_found(id))?;

        let rank = self.rank(id).await?;
        info!(
            id,
            old_score = previous.score,
            new_score = score,
            rank,
            "Score updated"
        );
        Ok(RankedEntity { entity, rank })
    }

    /// Writes a score on its own task and queues invalidation once the write settles.
    ///
    /// The write outlives a caller that stops waiting, so the invalidation still follows it.
    fn write_score(
        &self,
        id: &str,
        score: i32,
    ) -> impl Future<Output = StoreResult<Option<Entity>>> {
        let store = Arc::clone(&self.store);
        let maintenance = self.maintenance.clone();
        let id = id.to_string();
        let write = tokio::spawn(async move {
            let written = store.update_score(&id, score).await;
            maintenance.invalidate(invalidated_by_score_change(&id));
            written
        });
        async move {
            write
                .await
                .map_err(|e| StoreError::Unavailable(format!("score write task failed: {e}")))?
        }
    }

    /// Returns one page of the global ranking ordered by `(score desc, name asc)`.
    #[instrument(skip(self))]
    pub async fn page(&self, page: u32, page_size: u32) -> RankResult<LeaderboardPage> {
        validate_page(page, page_size)?;

        let generation = self
            .cache
            .ensure_leaderboard_generation(self.config.leaderboard_ttl)
            .await;
        if let Some(generation) = &generation
            && let Some(listing) = self
                .cache
                .leaderboard_page(generation, page, page_size)
                .await
        {
            debug!("Leaderboard page cache hit");
            return Ok(listing);
        }

        let listing = self.compute_page(page, page_size).await?;

        if let Some(generation) = generation {
            self.maintenance.populate(
                leaderboard_page_key(&generation, page, page_size),
                &listing,
                self.config.leaderboard_ttl,
            );
        }

        debug!(
            total = listing.total,
            entries = listing.entries.len(),
            "Leaderboard page computed"
        );
        Ok(listing)
    }

    async fn compute_page(&self, page: u32, page_size: u32) -> RankResult<LeaderboardPage> {
        let offset = page_offset(page, page_size);
        let total = self.call_store("count_all", self.store.count_all()).await?;
        let rows = self
            .call_store("page", self.store.page(offset, u64::from(page_size)))
            .await?;

        let leading_rank = match rows.first() {
            Some(first) if offset > 0 && self.config.exact_page_boundaries => Some(
                self.call_store("count_greater_than", self.store.count_greater_than(first.score))
                    .await?
                    + 1,
            ),
            _ => None,
        };

        Ok(LeaderboardPage {
            entries: assign_ranks(&rows, offset, leading_rank),
            total,
            page,
            page_size,
            has_more: has_more(offset, page_size, total),
        })
    }

    /// Returns the page of `2 * context_size` rows that places `id` near its middle.
    #[instrument(skip(self))]
    pub async fn page_around(&self, id: &str, context_size: u32) -> RankResult<LeaderboardPage> {
        validate_context_size(context_size)?;
        let rank = self.rank(id).await?;
        let (page, page_size) = window_around(rank, context_size);
        debug!(rank, page, page_size, "Leaderboard window chosen");
        self.page(page, page_size).await
    }

    /// Creates a new entity and returns it with its rank.
    #[instrument(skip(self))]
    pub async fn register(&self, id: &str, name: &str, score: i32) -> RankResult<RankedEntity> {
        validate_id(id)?;
        validate_name(name)?;
        validate_score(score)?;
        let name = name.trim();

        if self
            .call_store("get_by_name", self.store.get_by_name(name))
            .await?
            .is_some()
        {
            return Err(RankError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let entity = Entity::new(id, name, score);
        match self
            .call_store("insert", self.store.insert(entity.clone()))
            .await
        {
            Ok(()) => {}
            Err(RankError::Store(StoreError::DuplicateName { name })) => {
                return Err(RankError::AlreadyExists { name });
            }
            Err(e) => return Err(e),
        }

        self.maintenance
            .populate(entity_key(id), &entity, self.config.entity_ttl);
        self.maintenance.invalidate(vec![LEADERBOARD_KEY.to_string()]);

        let rank = self.rank(id).await?;
        info!(id, name, score, rank, "Entity registered");
        Ok(RankedEntity { entity, rank })
    }

    /// Looks an entity up by name, case-insensitively.
    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> RankResult<Option<RankedEntity>> {
        validate_name(name)?;

        let Some(entity) = self
            .call_store("get_by_name", self.store.get_by_name(name.trim()))
            .await?
        else {
            return Ok(None);
        };

        let rank = self.rank(&entity.id).await?;
        Ok(Some(RankedEntity { entity, rank }))
    }

    /// Liveness: the answer cache serves a trivial read within its timeout.
    pub async fn is_healthy(&self) -> bool {
        self.cache.ping().await
    }

    /// Resolves once every queued cache job has run.
    pub async fn wait_for_background(&self) {
        self.maintenance.wait_idle().await;
    }

    /// Stops the cache maintenance workers after draining their queue.
    pub async fn shutdown(&self) {
        self.maintenance.shutdown().await;
    }
}
