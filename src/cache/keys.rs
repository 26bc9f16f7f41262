//! Cache key layout.

use crate::constants::{ENTITY_KEY_PREFIX, LEADERBOARD_KEY, RANK_KEY_PREFIX};

#[inline]
pub fn entity_key(id: &str) -> String {
    format!("{ENTITY_KEY_PREFIX}{id}")
}

#[inline]
pub fn rank_key(id: &str) -> String {
    format!("{RANK_KEY_PREFIX}{id}")
}

/// Key of one cached leaderboard page under a listing generation.
#[inline]
pub fn leaderboard_page_key(generation: &str, page: u32, page_size: u32) -> String {
    format!("{LEADERBOARD_KEY}:{generation}:{page}:{page_size}")
}

/// Every key a score change for `id` makes stale.
pub fn invalidated_by_score_change(id: &str) -> Vec<String> {
    vec![entity_key(id), rank_key(id), LEADERBOARD_KEY.to_string()]
}
