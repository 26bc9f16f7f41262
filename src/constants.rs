//! Cross-cutting, shared constants.
//!
//! Score and name bounds are invariants of the ranking domain: the service enforces them
//! regardless of what the boundary layer already checked.

use std::time::Duration;

/// Lowest score an entity may hold (inclusive).
pub const MIN_SCORE: i32 = 100;
/// Highest score an entity may hold (inclusive).
pub const MAX_SCORE: i32 = 5000;

/// Minimum display-name length in characters.
pub const MIN_NAME_LEN: usize = 3;
/// Maximum display-name length in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Maximum entity id length in bytes.
pub const MAX_ID_LEN: usize = 128;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 1000;

pub const DEFAULT_CONTEXT_SIZE: u32 = 10;
pub const MAX_CONTEXT_SIZE: u32 = 100;

pub const ENTITY_TTL: Duration = Duration::from_secs(5 * 60);
pub const RANK_TTL: Duration = Duration::from_secs(3 * 60);
pub const LEADERBOARD_TTL: Duration = Duration::from_secs(2 * 60);

pub const ENTITY_KEY_PREFIX: &str = "entity:";
pub const RANK_KEY_PREFIX: &str = "rank:";
/// Singleton key holding the current leaderboard listing generation.
pub const LEADERBOARD_KEY: &str = "leaderboard";

/// Key read by the liveness probe. Never written.
pub const HEALTH_PROBE_KEY: &str = "health-check";

/// Number of distinct score values; sizes the store's count index.
pub const SCORE_DOMAIN: usize = (MAX_SCORE - MIN_SCORE + 1) as usize;
