//! In-memory ordering structures behind [`super::MemoryScoreStore`].

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use super::error::{StoreError, StoreResult};
use crate::constants::{MAX_SCORE, MIN_SCORE, SCORE_DOMAIN};
use crate::model::Entity;
use crate::validation::canonical_name;

/// Fenwick tree of entity counts per score over `[MIN_SCORE, MAX_SCORE]`.
#[derive(Debug, Clone)]
pub(crate) struct ScoreCounts {
    tree: Vec<u64>,
    total: u64,
}

impl Default for ScoreCounts {
    fn default() -> Self {
        Self {
            tree: vec![0; SCORE_DOMAIN + 1],
            total: 0,
        }
    }
}

impl ScoreCounts {
    #[inline]
    fn slot(score: i32) -> usize {
        (score - MIN_SCORE) as usize + 1
    }

    pub(crate) fn increment(&mut self, score: i32) {
        let mut i = Self::slot(score);
        while i < self.tree.len() {
            self.tree[i] += 1;
            i += i & i.wrapping_neg();
        }
        self.total += 1;
    }

    pub(crate) fn decrement(&mut self, score: i32) {
        let mut i = Self::slot(score);
        while i < self.tree.len() {
            self.tree[i] -= 1;
            i += i & i.wrapping_neg();
        }
        self.total -= 1;
    }

    fn prefix(&self, slot: usize) -> u64 {
        let mut i = slot;
        let mut sum = 0;
        while i > 0 {
            sum += self.tree[i];
            i -= i & i.wrapping_neg();
        }
        sum
    }

    /// Number of entities whose score is `<= score`.
    pub(crate) fn at_most(&self, score: i32) -> u64 {
        if score < MIN_SCORE {
            0
        } else if score >= MAX_SCORE {
            self.total
        } else {
            self.prefix(Self::slot(score))
        }
    }

    /// Number of entities whose score is strictly greater than `score`.
    #[inline]
    pub(crate) fn greater_than(&self, score: i32) -> u64 {
        self.total - self.at_most(score)
    }

    #[inline]
    pub(crate) fn total(&self) -> u64 {
        self.total
    }
}

/// Global ordering key: score descending, then name, then id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct OrderKey {
    score: Reverse<i32>,
    name: String,
    id: String,
}

impl OrderKey {
    fn of(entity: &Entity) -> Self {
        Self {
            score: Reverse(entity.score),
            name: entity.name.clone(),
            id: entity.id.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Index {
    by_id: HashMap<String, Entity>,
    by_name: HashMap<String, String>,
    order: BTreeSet<OrderKey>,
    counts: ScoreCounts,
}

impl Index {
    pub(crate) fn get(&self, id: &str) -> Option<&Entity> {
        self.by_id.get(id)
    }

    pub(crate) fn get_by_name(&self, name: &str) -> Option<&Entity> {
        self.by_name
            .get(&canonical_name(name))
            .and_then(|id| self.by_id.get(id))
    }

    /// Checks that `entity` could be inserted, without inserting it.
    pub(crate) fn check_insert(&self, entity: &Entity) -> StoreResult<()> {
        check_domain(entity.score)?;
        if self.by_id.contains_key(&entity.id) {
            return Err(StoreError::DuplicateId {
                id: entity.id.clone(),
            });
        }
        if self.by_name.contains_key(&canonical_name(&entity.name)) {
            return Err(StoreError::DuplicateName {
                name: entity.name.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, entity: Entity) -> StoreResult<()> {
        self.check_insert(&entity)?;

        self.by_name
            .insert(canonical_name(&entity.name), entity.id.clone());
        self.order.insert(OrderKey::of(&entity));
        self.counts.increment(entity.score);
        self.by_id.insert(entity.id.clone(), entity);
        Ok(())
    }

    /// The record `id` would become with `score`, or `None` if absent. Changes nothing.
    pub(crate) fn rescored(
        &self,
        id: &str,
        score: i32,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Entity>> {
        check_domain(score)?;
        Ok(self.by_id.get(id).map(|current| Entity {
            score,
            updated_at: at,
            ..current.clone()
        }))
    }

    /// Swaps in `entity` for the record with the same id, returning the old record.
    ///
    /// The name must be unchanged. Returns `None` (and changes nothing) if the id is absent.
    pub(crate) fn replace(&mut self, entity: Entity) -> Option<Entity> {
        let slot = self.by_id.get_mut(&entity.id)?;
        let previous = std::mem::replace(slot, entity);
        let current = &self.by_id[&previous.id];
        self.order.remove(&OrderKey::of(&previous));
        self.counts.decrement(previous.score);
        self.order.insert(OrderKey::of(current));
        self.counts.increment(current.score);
        Some(previous)
    }

    #[inline]
    pub(crate) fn count_greater_than(&self, score: i32) -> u64 {
        self.counts.greater_than(score)
    }

    #[inline]
    pub(crate) fn len(&self) -> u64 {
        self.counts.total()
    }

    pub(crate) fn page(&self, offset: u64, limit: u64) -> Vec<Entity> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        self.order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|key| self.by_id.get(&key.id).cloned())
            .collect()
    }

    /// All entities in ranking order.
    pub(crate) fn ordered(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|key| self.by_id.get(&key.id))
    }
}

fn check_domain(score: i32) -> StoreResult<()> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(StoreError::ScoreOutOfDomain { score })
    }
}
