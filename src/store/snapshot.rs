//! Durable snapshot file for [`super::MemoryScoreStore`] (rkyv, atomic replace).

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, from_bytes, to_bytes};

use super::error::{StoreError, StoreResult};
use crate::model::Entity;

const SNAPSHOT_VERSION: u32 = 1;

const TEMP_SUFFIX: &str = ".tmp";

/// On-disk form of an [`Entity`]; timestamps are Unix milliseconds.
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub score: i32,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl From<&Entity> for EntityRecord {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            score: entity.score,
            created_at_ms: entity.created_at.timestamp_millis(),
            updated_at_ms: entity.updated_at.timestamp_millis(),
        }
    }
}

impl TryFrom<EntityRecord> for Entity {
    type Error = StoreError;

    fn try_from(record: EntityRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: millis_to_utc(record.created_at_ms)?,
            updated_at: millis_to_utc(record.updated_at_ms)?,
            id: record.id,
            name: record.name,
            score: record.score,
        })
    }
}

#[derive(Archive, Deserialize, Serialize, Debug)]
struct SnapshotBody {
    version: u32,
    entities: Vec<EntityRecord>,
}

#[derive(Debug, Clone)]
/// A single snapshot file, replaced atomically on every save.
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(TEMP_SUFFIX);
        PathBuf::from(name)
    }

    /// Reads the snapshot, or `None` if no snapshot has been written yet.
    pub fn load(&self) -> StoreResult<Option<Vec<Entity>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read(&self.path)?;
        let mut bytes = AlignedVec::<16>::with_capacity(raw.len());
        bytes.extend_from_slice(&raw);

        let body = from_bytes::<SnapshotBody, RkyvError>(&bytes)
            .map_err(|e| StoreError::Persistence(format!("corrupt snapshot: {e}")))?;

        if body.version != SNAPSHOT_VERSION {
            return Err(StoreError::Persistence(format!(
                "unsupported snapshot version {} (expected {})",
                body.version, SNAPSHOT_VERSION
            )));
        }

        body.entities
            .into_iter()
            .map(Entity::try_from)
            .collect::<StoreResult<Vec<_>>>()
            .map(Some)
    }

    /// Writes `entities` to a temp file, fsyncs it, then renames it over the snapshot.
    pub fn save(&self, entities: Vec<EntityRecord>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let body = SnapshotBody {
            version: SNAPSHOT_VERSION,
            entities,
        };
        let bytes = to_bytes::<RkyvError>(&body)
            .map_err(|e| StoreError::Persistence(format!("serialization failed: {e}")))?;

        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

fn millis_to_utc(ms: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Persistence(format!("timestamp out of range: {ms}")))
}
