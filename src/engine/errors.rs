//! Engine-level error type
//!
//! Wraps every subsystem error. Classification:
//! - validation: the call was rejected before any state changed
//! - format: on-disk data (WAL or snapshot) is malformed
//! - everything else is an I/O failure

use thiserror::Error;

use crate::config::{ConfigError, ConfigErrorCode};
use crate::index::IndexError;
use crate::planner::PlannerError;
use crate::snapshot::SnapshotError;
use crate::store::StoreError;
use crate::value::DocumentError;
use crate::wal::WalError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error(transparent)]
    Wal(#[from] WalError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("[REJECT] CAIRN_VALIDATION: {0}")]
    Validation(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    /// True if the call was rejected without touching any state
    pub fn is_validation(&self) -> bool {
        match self {
            EngineError::Store(_)
            | EngineError::Index(_)
            | EngineError::Planner(_)
            | EngineError::Validation(_) => true,
            EngineError::Config(e) => e.code() == ConfigErrorCode::CairnConfigInvalid,
            EngineError::Wal(_) | EngineError::Snapshot(_) => false,
        }
    }

    /// True if persisted data is malformed
    pub fn is_format(&self) -> bool {
        match self {
            EngineError::Wal(e) => e.is_corruption(),
            EngineError::Snapshot(e) => e.is_format(),
            _ => false,
        }
    }

    /// Stable string code of the underlying error
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Store(e) => e.code().code(),
            EngineError::Index(e) => e.code().code(),
            EngineError::Planner(e) => e.code().code(),
            EngineError::Wal(e) => e.code().code(),
            EngineError::Snapshot(e) => e.code().code(),
            EngineError::Config(e) => e.code().code(),
            EngineError::Validation(_) => "CAIRN_VALIDATION",
        }
    }
}

impl From<DocumentError> for EngineError {
    fn from(e: DocumentError) -> Self {
        EngineError::Validation(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err: EngineError = StoreError::duplicate_id(3).into();
        assert!(err.is_validation());
        assert!(!err.is_format());
        assert_eq!(err.code(), "CAIRN_STORE_DUPLICATE_ID");

        let err: EngineError = WalError::corruption_at_line(2, 40, "bad json").into();
        assert!(err.is_format());
        assert!(!err.is_validation());
        assert_eq!(err.code(), "CAIRN_WAL_CORRUPTION");

        let err: EngineError = SnapshotError::format("missing field 'documents'").into();
        assert!(err.is_format());
    }

    #[test]
    fn test_validation_display() {
        let err = EngineError::validation("patch must not be empty");
        assert_eq!(err.to_string(), "[REJECT] CAIRN_VALIDATION: patch must not be empty");
        assert_eq!(err.code(), "CAIRN_VALIDATION");
    }
}
