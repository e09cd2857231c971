//! Snapshot error types
//!
//! Error codes:
//! - CAIRN_SNAPSHOT_IO (ERROR)
//! - CAIRN_SNAPSHOT_FORMAT (ERROR)
//! - CAIRN_SNAPSHOT_CHECKSUM_MISMATCH (ERROR)
//!
//! Snapshot failures never leave the engine half-loaded: loads build into
//! fresh structures and saves write through a temporary file.

use std::fmt;
use std::io;
use std::path::Path;

/// Snapshot-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotErrorCode {
    /// Reading, writing or syncing a snapshot file failed
    CairnSnapshotIo,
    /// The snapshot content is malformed or unsupported
    CairnSnapshotFormat,
    /// The snapshot does not match its `.meta` companion
    CairnSnapshotChecksumMismatch,
}

impl SnapshotErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SnapshotErrorCode::CairnSnapshotIo => "CAIRN_SNAPSHOT_IO",
            SnapshotErrorCode::CairnSnapshotFormat => "CAIRN_SNAPSHOT_FORMAT",
            SnapshotErrorCode::CairnSnapshotChecksumMismatch => "CAIRN_SNAPSHOT_CHECKSUM_MISMATCH",
        }
    }
}

impl fmt::Display for SnapshotErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Snapshot error type with context
#[derive(Debug)]
pub struct SnapshotError {
    code: SnapshotErrorCode,
    message: String,
    source: Option<io::Error>,
    /// The new snapshot file already replaced the target when this occurred
    committed: bool,
}

impl SnapshotError {
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: SnapshotErrorCode::CairnSnapshotIo,
            message: message.into(),
            source: Some(source),
            committed: false,
        }
    }

    /// I/O error naming the file involved
    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self::io_error(format!("I/O error on {}", path.display()), source)
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self {
            code: SnapshotErrorCode::CairnSnapshotFormat,
            message: message.into(),
            source: None,
            committed: false,
        }
    }

    pub fn checksum_mismatch(path: &Path, expected: &str, actual: &str) -> Self {
        Self {
            code: SnapshotErrorCode::CairnSnapshotChecksumMismatch,
            message: format!(
                "{} does not match its metadata: expected {}, found {}",
                path.display(),
                expected,
                actual
            ),
            source: None,
            committed: false,
        }
    }

    /// Marks a save failure that happened after the snapshot file was
    /// renamed into place.
    pub fn after_commit(mut self) -> Self {
        self.committed = true;
        self
    }

    /// Returns true if the target already holds the new snapshot
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn code(&self) -> SnapshotErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true for malformed or inconsistent snapshot content
    pub fn is_format(&self) -> bool {
        matches!(
            self.code,
            SnapshotErrorCode::CairnSnapshotFormat | SnapshotErrorCode::CairnSnapshotChecksumMismatch
        )
    }

    /// Returns true if the snapshot file does not exist
    pub fn is_not_found(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)?;
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;
