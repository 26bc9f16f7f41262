//! Answer cache: a TTL key/value cache in front of the score store.
//!
//! Backends implement [`AnswerCache`] over opaque bytes. The service only goes through
//! [`RankCache`], which owns the key layout, the payload encoding and the rule that a
//! failing cache behaves like an empty one.

pub mod answers;
pub mod error;
pub mod keys;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod moka;


use std::future::Future;
use std::time::Duration;

pub use answers::RankCache;
pub use error::{CacheError, CacheResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockAnswerCache;
pub use moka::MokaAnswerCache;

/// Key/value cache with a per-entry time to live.
pub trait AnswerCache: Send + Sync + 'static {
    /// Returns the live value for `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> impl Future<Output = CacheResult<Option<Vec<u8>>>> + Send;

    /// Stores `value` under `key`, replacing any previous value and its TTL.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Removes `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = CacheResult<()>> + Send;
}
