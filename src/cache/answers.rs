//! Typed view of the answer cache used by the rank service.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use super::AnswerCache;
use super::error::{CacheError, CacheResult};
use super::keys::{entity_key, leaderboard_page_key, rank_key};
use crate::constants::{HEALTH_PROBE_KEY, LEADERBOARD_KEY};
use crate::model::{Entity, LeaderboardPage};

/// Encodes a cache payload.
pub fn encode<T: Serialize>(key: &str, value: &T) -> CacheResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CacheError::Codec {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> CacheResult<T> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::Codec {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Answer cache wrapper that never fails.
///
/// Every backend error, timeout or undecodable payload is logged and reported as a miss
/// (reads) or as a skipped write, so the service always falls through to the store.
#[derive(Debug)]
pub struct RankCache<C> {
    backend: Arc<C>,
    timeout: Duration,
}

impl<C> Clone for RankCache<C> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            timeout: self.timeout,
        }
    }
}

impl<C: AnswerCache> RankCache<C> {
    pub fn new(backend: Arc<C>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Shared handle to the raw backend.
    pub fn backend(&self) -> &Arc<C> {
        &self.backend
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        key: &str,
        fut: impl Future<Output = CacheResult<T>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(op, key, error = %e, "Cache call failed; treating as miss");
                None
            }
            Err(_) => {
                warn!(
                    op,
                    key,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Cache call timed out; treating as miss"
                );
                None
            }
        }
    }

    /// Reads and decodes `key`. Any failure is a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.bounded("get", key, self.backend.get(key)).await??;
        match decode(key, &bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Encodes and writes `value`. Returns `false` if the write did not happen.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let bytes = match encode(key, value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "Skipping cache write");
                return false;
            }
        };
        self.set_bytes(key, bytes, ttl).await
    }

    /// Writes an already encoded payload. Returns `false` if the write did not happen.
    pub async fn set_bytes(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> bool {
        self.bounded("set", key, self.backend.set(key, bytes, ttl))
            .await
            .is_some()
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.bounded("delete", key, self.backend.delete(key))
            .await
            .is_some()
    }

    pub async fn entity(&self, id: &str) -> Option<Entity> {
        self.get_json(&entity_key(id)).await
    }

    pub async fn rank(&self, id: &str) -> Option<u64> {
        self.get_json(&rank_key(id)).await
    }

    pub async fn store_rank(&self, id: &str, rank: u64, ttl: Duration) -> bool {
        self.set_json(&rank_key(id), &rank, ttl).await
    }

    /// Current leaderboard listing generation, if one is live.
    pub async fn leaderboard_generation(&self) -> Option<String> {
        self.get_json(LEADERBOARD_KEY).await
    }

    /// Returns the live listing generation, opening a new one if there is none.
    ///
    /// `None` means pages cannot be cached right now. Deleting the singleton key orphans
    /// every page cached under the old generation.
    pub async fn ensure_leaderboard_generation(&self, ttl: Duration) -> Option<String> {
        if let Some(generation) = self.leaderboard_generation().await {
            return Some(generation);
        }
        let generation = Uuid::new_v4().simple().to_string();
        if self.set_json(LEADERBOARD_KEY, &generation, ttl).await {
            debug!(generation = %generation, "Opened leaderboard cache generation");
            Some(generation)
        } else {
            None
        }
    }

    pub async fn leaderboard_page(
        &self,
        generation: &str,
        page: u32,
        page_size: u32,
    ) -> Option<LeaderboardPage> {
        self.get_json(&leaderboard_page_key(generation, page, page_size))
            .await
    }

    /// Issues a trivial read within the cache timeout.
    pub async fn ping(&self) -> bool {
        self.bounded("ping", HEALTH_PROBE_KEY, self.backend.get(HEALTH_PROBE_KEY))
            .await
            .is_some()
    }
}
