//! In-process score store with an optional durable snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::ScoreStore;
use super::error::{StoreError, StoreResult};
use super::index::Index;
use super::snapshot::{EntityRecord, SnapshotFile};
use crate::model::Entity;

#[derive(Debug, Default)]
struct Shared {
    index: RwLock<Index>,
    snapshot: Option<SnapshotFile>,
    /// Serializes persist-then-apply so snapshots are written in mutation order.
    write_lock: Mutex<()>,
}

impl Shared {
    fn insert(&self, entity: Entity) -> StoreResult<()> {
        let _write = self.write_lock.lock();
        self.index.read().check_insert(&entity)?;
        self.persist(&entity)?;
        self.index.write().insert(entity)
    }

    fn update_score(&self, id: &str, score: i32) -> StoreResult<Option<Entity>> {
        let _write = self.write_lock.lock();
        let Some(updated) = self.index.read().rescored(id, score, Utc::now())? else {
            return Ok(None);
        };

        if let Err(e) = self.persist(&updated) {
            warn!(id, error = %e, "Score update not applied after failed persist");
            return Err(e);
        }

        self.index.write().replace(updated.clone());
        Ok(Some(updated))
    }

    /// Writes the snapshot as it will be once `pending` is applied.
    fn persist(&self, pending: &Entity) -> StoreResult<()> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(());
        };
        let mut records: Vec<EntityRecord> = {
            let index = self.index.read();
            index
                .ordered()
                .filter(|e| e.id != pending.id)
                .map(Into::into)
                .collect()
        };
        records.push(pending.into());
        let count = records.len();
        snapshot.save(records)?;
        debug!(entities = count, path = %snapshot.path().display(), "Snapshot written");
        Ok(())
    }
}

/// Score store kept in memory, indexed for O(log n) rank counts.
///
/// Opened with [`MemoryScoreStore::open`], every mutation is written to a snapshot file
/// before it is acknowledged. [`MemoryScoreStore::new`] keeps nothing on disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    shared: Arc<Shared>,
}

impl MemoryScoreStore {
    /// Creates an empty, non-durable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or creates) a durable store backed by the snapshot at `path`.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let snapshot = SnapshotFile::new(path);
        let mut index = Index::default();

        if let Some(entities) = snapshot.load()? {
            for entity in entities {
                index.insert(entity)?;
            }
        }

        info!(
            entities = index.len(),
            path = %snapshot.path().display(),
            "Score store opened"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                index: RwLock::new(index),
                snapshot: Some(snapshot),
                write_lock: Mutex::new(()),
            }),
        })
    }

    /// Builds a non-durable store pre-populated with `entities`.
    pub fn with_entities(entities: impl IntoIterator<Item = Entity>) -> StoreResult<Self> {
        let mut index = Index::default();
        for entity in entities {
            index.insert(entity)?;
        }
        Ok(Self {
            shared: Arc::new(Shared {
                index: RwLock::new(index),
                ..Default::default()
            }),
        })
    }

    /// Snapshot location, if this store is durable.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.shared.snapshot.as_ref().map(SnapshotFile::path)
    }

    /// Number of stored entities.
    pub fn len(&self) -> u64 {
        self.shared.index.read().len()
    }

    /// Returns `true` if the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs a mutation, off the async runtime when it has to touch disk.
    async fn mutate<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&Shared) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        if self.shared.snapshot.is_none() {
            return op(self.shared.as_ref());
        }

        let shared = Arc::clone(&self.shared);
        tokio::task::spawn_blocking(move || op(shared.as_ref()))
            .await
            .map_err(|e| StoreError::Unavailable(format!("persistence task failed: {e}")))?
    }
}

impl ScoreStore for MemoryScoreStore {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Entity>> {
        Ok(self.shared.index.read().get(id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<Option<Entity>> {
        Ok(self.shared.index.read().get_by_name(name).cloned())
    }

    async fn insert(&self, entity: Entity) -> StoreResult<()> {
        self.mutate(move |shared| shared.insert(entity)).await
    }

    async fn update_score(&self, id: &str, score: i32) -> StoreResult<Option<Entity>> {
        let id = id.to_owned();
        self.mutate(move |shared| shared.update_score(&id, score)).await
    }

    async fn count_greater_than(&self, score: i32) -> StoreResult<u64> {
        Ok(self.shared.index.read().count_greater_than(score))
    }

    async fn page(&self, offset: u64, limit: u64) -> StoreResult<Vec<Entity>> {
        Ok(self.shared.index.read().page(offset, limit))
    }

    async fn count_all(&self) -> StoreResult<u64> {
        Ok(self.shared.index.read().len())
    }
}
