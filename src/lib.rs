//! Ladder library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! ## Service
//! - [`RankService`], [`ServiceConfig`], [`RankError`] - tie-aware ranks and leaderboard pages
//!
//! ## Collaborators
//! - [`ScoreStore`], [`MemoryScoreStore`] - source of truth for entities and scores
//! - [`AnswerCache`], [`MokaAnswerCache`], [`RankCache`] - TTL cache in front of the store
//! - [`KeyedLocks`] - per-id singleflight lock table
//! - [`CacheMaintenance`] - bounded queue for cache population and invalidation
//!
//! ## Boundary
//! - [`Config`], [`ConfigError`] - `LADDER_*` environment configuration
//! - [`gateway`] - Axum router over the service
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod background;
pub mod cache;
pub mod config;
pub mod constants;
pub mod gateway;
pub mod hashing;
pub mod lock;
pub mod model;
pub mod service;
pub mod store;
pub mod validation;

pub use background::{CacheJob, CacheMaintenance};
#[cfg(any(test, feature = "mock"))]
pub use cache::MockAnswerCache;
pub use cache::{AnswerCache, CacheError, CacheResult, MokaAnswerCache, RankCache};
pub use config::{Config, ConfigError};
pub use hashing::{hash_to_u64, shard_index};
pub use lock::{KeyGuard, KeyedLocks};
pub use model::{Entity, LeaderboardEntry, LeaderboardPage, RankedEntity};
pub use service::{RankError, RankResult, RankService, ServiceConfig};
#[cfg(any(test, feature = "mock"))]
pub use store::CountingScoreStore;
pub use store::{MemoryScoreStore, ScoreStore, StoreError, StoreResult, seed_demo};
pub use validation::ValidationError;
