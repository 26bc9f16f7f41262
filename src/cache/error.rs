use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by answer cache backends.
pub enum CacheError {
    /// Backend could not serve the request.
    #[error("cache unavailable: {reason}")]
    Unavailable {
        /// Error message.
        reason: String,
    },

    /// A cached payload could not be encoded or decoded.
    #[error("cache payload codec error for key '{key}': {reason}")]
    Codec {
        /// Key whose payload failed.
        key: String,
        /// Error message.
        reason: String,
    },
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
