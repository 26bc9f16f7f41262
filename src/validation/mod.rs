//! Domain bounds checks shared by the service and the HTTP gateway.

pub mod error;


pub use error::ValidationError;

use crate::constants::{
    MAX_CONTEXT_SIZE, MAX_ID_LEN, MAX_NAME_LEN, MAX_PAGE_SIZE, MAX_SCORE, MIN_NAME_LEN, MIN_SCORE,
};

/// Checks `score` against the closed interval `[MIN_SCORE, MAX_SCORE]`.
pub fn validate_score(score: i32) -> Result<(), ValidationError> {
    if score < MIN_SCORE {
        return Err(ValidationError::ScoreBelowMinimum {
            score,
            min: MIN_SCORE,
        });
    }
    if score > MAX_SCORE {
        return Err(ValidationError::ScoreAboveMaximum {
            score,
            max: MAX_SCORE,
        });
    }
    Ok(())
}

/// Checks a display name after trimming surrounding whitespace.
///
/// Accepts letters, digits, `_` and `-`. Length is counted in characters.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    let len = name.chars().count();

    if len < MIN_NAME_LEN {
        return Err(ValidationError::NameTooShort {
            len,
            min: MIN_NAME_LEN,
        });
    }
    if len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            len,
            max: MAX_NAME_LEN,
        });
    }

    if let Some(ch) = name.chars().find(|ch| !is_name_char(*ch)) {
        return Err(ValidationError::NameInvalidChar { ch });
    }

    Ok(())
}

pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::IdTooLong {
            len: id.len(),
            max: MAX_ID_LEN,
        });
    }
    Ok(())
}

pub fn validate_page(page: u32, page_size: u32) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::PageNumber { page });
    }
    if page_size < 1 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::PageSize {
            size: page_size,
            max: MAX_PAGE_SIZE,
        });
    }
    Ok(())
}

pub fn validate_context_size(size: u32) -> Result<(), ValidationError> {
    if size < 1 || size > MAX_CONTEXT_SIZE {
        return Err(ValidationError::ContextSize {
            size,
            max: MAX_CONTEXT_SIZE,
        });
    }
    Ok(())
}

/// Lookup form of a name: trimmed and lowercased.
#[inline]
pub fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[inline]
fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}
