use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by score store backends.
pub enum StoreError {
    /// Backend could not serve the request (connectivity, task failure, injected fault).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An entity with this id already exists.
    #[error("entity id '{id}' already exists")]
    DuplicateId {
        /// Conflicting id.
        id: String,
    },

    /// The name is already taken (case-insensitive).
    #[error("name '{name}' is already taken")]
    DuplicateName {
        /// Conflicting name as supplied.
        name: String,
    },

    /// Score outside the domain the store indexes.
    #[error("score {score} is outside the indexed score domain")]
    ScoreOutOfDomain {
        /// Rejected score.
        score: i32,
    },

    /// Durable write could not be acknowledged.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
