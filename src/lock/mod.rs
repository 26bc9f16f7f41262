//! Per-key async lock table.
//!
//! Concurrent computations for the same key are serialized; different keys never wait on
//! each other beyond a short shard-map critical section. A key's slot exists only while
//! someone holds or waits for it.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

use crate::hashing::shard_index;

#[derive(Debug)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    /// Holders plus waiters.
    users: usize,
}

#[derive(Debug)]
struct Table {
    shards: Box<[Mutex<HashMap<String, Slot>>]>,
}

/// Registration of one holder or waiter on a slot. Dropping it unregisters.
#[derive(Debug)]
struct Lease {
    table: Arc<Table>,
    shard: usize,
    key: String,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut slots = self.table.shards[self.shard].lock();
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Exclusive hold on one key. Released on drop.
#[derive(Debug)]
pub struct KeyGuard {
    // Field order matters: the mutex is released before the lease is returned.
    _guard: OwnedMutexGuard<()>,
    _lease: Lease,
}

/// Sharded table of per-key async mutexes. Clones share the same table.
#[derive(Debug, Clone)]
pub struct KeyedLocks {
    table: Arc<Table>,
}

impl KeyedLocks {
    pub const DEFAULT_SHARDS: usize = 64;

    /// Creates a table with `shards` shards (at least one).
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect();
        Self {
            table: Arc::new(Table { shards }),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.table.shards.len()
    }

    /// Waits for exclusive ownership of `key`.
    ///
    /// Cancel-safe: dropping the returned future before it resolves withdraws this caller
    /// without disturbing other holders or waiters.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let shard = shard_index(key, self.table.shards.len());

        let (lock, lease) = {
            let mut slots = self.table.shards[shard].lock();
            let slot = slots.entry(key.to_string()).or_insert_with(|| Slot {
                lock: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            if slot.users > 1 {
                trace!(key, waiters = slot.users - 1, "Waiting on in-flight key");
            }
            (
                Arc::clone(&slot.lock),
                Lease {
                    table: Arc::clone(&self.table),
                    shard,
                    key: key.to_string(),
                },
            )
        };

        let guard = lock.lock_owned().await;
        KeyGuard {
            _guard: guard,
            _lease: lease,
        }
    }

    /// Number of keys currently held or waited on.
    pub fn in_flight(&self) -> usize {
        self.table.shards.iter().map(|shard| shard.lock().len()).sum()
    }
}

impl Default for KeyedLocks {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SHARDS)
    }
}
