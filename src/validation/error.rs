use thiserror::Error;

/// A caller-supplied value violated a domain bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("score {score} is below the minimum of {min}")]
    ScoreBelowMinimum { score: i32, min: i32 },

    #[error("score {score} exceeds the maximum of {max}")]
    ScoreAboveMaximum { score: i32, max: i32 },

    #[error("name must be at least {min} characters, got {len}")]
    NameTooShort { len: usize, min: usize },

    #[error("name must not exceed {max} characters, got {len}")]
    NameTooLong { len: usize, max: usize },

    #[error("name contains invalid character '{ch}'")]
    NameInvalidChar { ch: char },

    #[error("id must not be empty")]
    EmptyId,

    #[error("id must not exceed {max} bytes, got {len}")]
    IdTooLong { len: usize, max: usize },

    #[error("page number must be at least 1, got {page}")]
    PageNumber { page: u32 },

    #[error("page size must be between 1 and {max}, got {size}")]
    PageSize { size: u32, max: u32 },

    #[error("context size must be between 1 and {max}, got {size}")]
    ContextSize { size: u32, max: u32 },
}
