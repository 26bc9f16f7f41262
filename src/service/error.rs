use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
/// Errors returned by [`super::RankService`] operations.
pub enum RankError {
    /// A caller-supplied value violated a domain bound.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The entity does not exist.
    #[error("entity '{id}' does not exist")]
    NotFound {
        /// Requested id.
        id: String,
    },

    /// Registration collided with an existing name (case-insensitive).
    #[error("name '{name}' is already taken")]
    AlreadyExists {
        /// Requested name.
        name: String,
    },

    /// The score store failed the request.
    #[error("score store failure: {0}")]
    Store(#[from] StoreError),

    /// A score store call exceeded its deadline.
    #[error("{operation} timed out")]
    Timeout {
        /// Store operation that timed out.
        operation: &'static str,
    },
}

impl RankError {
    pub(crate) fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience result type for rank service operations.
pub type RankResult<T> = Result<T, RankError>;
