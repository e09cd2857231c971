//! Document store error types
//!
//! Error codes:
//! - CAIRN_STORE_INVALID_ID (ERROR)
//! - CAIRN_STORE_DUPLICATE_ID (ERROR)
//! - CAIRN_STORE_IMMUTABLE_FIELD (ERROR)
//!
//! All store errors are validation failures: the call is rejected before any
//! state changes and is never retried.

use std::fmt;

use crate::value::DocumentId;

/// Store-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// `_id` is present but is not a usable identifier
    CairnStoreInvalidId,
    /// `_id` already belongs to a live document
    CairnStoreDuplicateId,
    /// A patch tried to change `_id` or `_createdAt`
    CairnStoreImmutableField,
}

impl StoreErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::CairnStoreInvalidId => "CAIRN_STORE_INVALID_ID",
            StoreErrorCode::CairnStoreDuplicateId => "CAIRN_STORE_DUPLICATE_ID",
            StoreErrorCode::CairnStoreImmutableField => "CAIRN_STORE_IMMUTABLE_FIELD",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with context
#[derive(Debug, Clone, PartialEq)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
}

impl StoreError {
    pub fn invalid_id(reason: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::CairnStoreInvalidId,
            message: reason.into(),
        }
    }

    pub fn duplicate_id(id: DocumentId) -> Self {
        Self {
            code: StoreErrorCode::CairnStoreDuplicateId,
            message: format!("document with _id {} already exists", id),
        }
    }

    pub fn immutable_field(field: &str, id: DocumentId) -> Self {
        Self {
            code: StoreErrorCode::CairnStoreImmutableField,
            message: format!("field '{}' of document {} cannot be changed", field, id),
        }
    }

    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for StoreError {}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_contains_code() {
        let err = StoreError::duplicate_id(7);
        let display = err.to_string();
        assert!(display.contains("CAIRN_STORE_DUPLICATE_ID"));
        assert!(display.contains("7"));
    }
}
