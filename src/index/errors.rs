//! Index error types
//!
//! Error codes:
//! - CAIRN_INDEX_INVALID_FIELD (ERROR)

use std::fmt;

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Field path is empty or malformed
    CairnIndexInvalidField,
}

impl IndexErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::CairnIndexInvalidField => "CAIRN_INDEX_INVALID_FIELD",
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with context
#[derive(Debug, Clone, PartialEq)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
}

impl IndexError {
    /// Create an invalid field error
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::CairnIndexInvalidField,
            message: format!("invalid index field '{}': {}", field, reason.into()),
        }
    }

    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
