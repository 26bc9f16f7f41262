//! Demo data for development deployments.

use tracing::info;
use uuid::Uuid;

use super::ScoreStore;
use super::error::StoreResult;
use crate::constants::{MAX_SCORE, MIN_SCORE};
use crate::model::Entity;

/// Name of the `i`-th demo entity (1-based).
pub fn demo_name(i: u32) -> String {
    format!("player{i:03}")
}

/// Deterministic pseudo-random score for the `i`-th demo entity, spread over the score domain.
pub fn demo_score(i: u32) -> i32 {
    let span = (MAX_SCORE - MIN_SCORE + 1) as u64;
    MIN_SCORE + ((u64::from(i) * 37) % span) as i32
}

/// Inserts `count` demo entities, skipping names that already exist.
///
/// Returns the number of entities actually inserted. Safe to run on every start.
pub async fn seed_demo<S: ScoreStore>(store: &S, count: u32) -> StoreResult<u32> {
    let mut inserted = 0;
    for i in 1..=count {
        let name = demo_name(i);
        if store.get_by_name(&name).await?.is_some() {
            continue;
        }
        store
            .insert(Entity::new(Uuid::new_v4().to_string(), name, demo_score(i)))
            .await?;
        inserted += 1;
    }

    info!(requested = count, inserted, "Demo entities seeded");
    Ok(inserted)
}
