//! Rank assignment and page arithmetic for leaderboard listings.

use crate::model::{Entity, LeaderboardEntry};

/// Zero-based offset of the first row of `page`.
#[inline]
pub fn page_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

#[inline]
pub fn has_more(offset: u64, page_size: u32, total: u64) -> bool {
    offset + u64::from(page_size) < total
}

/// Assigns tie-aware ranks to an ordered slice that starts at `offset`.
///
/// Rows sharing a score share the rank of the first of them. `leading_rank`, when given,
/// is the true rank of the first row and replaces its position-based rank, so a tie run
/// that started on an earlier page keeps its shared rank.
pub fn assign_ranks(
    rows: &[Entity],
    offset: u64,
    leading_rank: Option<u64>,
) -> Vec<LeaderboardEntry> {
    let mut previous_score: Option<i32> = None;
    let mut current_rank = 0;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if previous_score != Some(row.score) {
                current_rank = match (i, leading_rank) {
                    (0, Some(rank)) => rank,
                    _ => offset + i as u64 + 1,
                };
                previous_score = Some(row.score);
            }
            LeaderboardEntry {
                rank: current_rank,
                id: row.id.clone(),
                name: row.name.clone(),
                score: row.score,
            }
        })
        .collect()
}

/// Page number and size of the window shown around an entity at `rank`.
///
/// Best effort: the target lands near the middle of the page, not exactly `context_size`
/// rows from either edge.
pub fn window_around(rank: u64, context_size: u32) -> (u32, u32) {
    let page_size = context_size.saturating_mul(2).max(1);
    let page = if rank > u64::from(context_size) {
        (rank - u64::from(context_size)) / u64::from(page_size)
    } else {
        1
    };
    let page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
    (page, page_size)
}
