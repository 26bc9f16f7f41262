//! Domain records shared by the store, the cache and the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scored entity as held by the score store.
///
/// `id` is assigned externally and never changes. `name` is unique case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Creates a new entity stamped with the current time.
    pub fn new(id: impl Into<String>, name: impl Into<String>, score: i32) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            score,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An entity together with its tie-aware rank at the time of the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntity {
    #[serde(flatten)]
    pub entity: Entity,
    pub rank: u64,
}

/// One row of a leaderboard page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub id: String,
    pub name: String,
    pub score: i32,
}

/// A slice of the global ranking ordered by `(score desc, name asc)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}
