//! WAL error types
//!
//! Error codes:
//! - CAIRN_WAL_IO (ERROR)
//! - CAIRN_WAL_APPEND_FAILED (ERROR)
//! - CAIRN_WAL_FSYNC_FAILED (FATAL)
//! - CAIRN_WAL_CORRUPTION (FATAL)
//! - CAIRN_WAL_POISONED (FATAL)

use std::fmt;
use std::io;

/// Severity levels for WAL errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, engine stays usable
    Error,
    /// Durability can no longer be guaranteed
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// WAL-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalErrorCode {
    /// Opening, reading or truncating the log failed
    CairnWalIo,
    /// Writing a record failed
    CairnWalAppendFailed,
    /// fsync after a write failed
    CairnWalFsyncFailed,
    /// A record could not be parsed or failed validation
    CairnWalCorruption,
    /// A failed append could not be rolled back; appends are refused
    CairnWalPoisoned,
}

impl WalErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            WalErrorCode::CairnWalIo => "CAIRN_WAL_IO",
            WalErrorCode::CairnWalAppendFailed => "CAIRN_WAL_APPEND_FAILED",
            WalErrorCode::CairnWalFsyncFailed => "CAIRN_WAL_FSYNC_FAILED",
            WalErrorCode::CairnWalCorruption => "CAIRN_WAL_CORRUPTION",
            WalErrorCode::CairnWalPoisoned => "CAIRN_WAL_POISONED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            WalErrorCode::CairnWalIo | WalErrorCode::CairnWalAppendFailed => Severity::Error,
            WalErrorCode::CairnWalFsyncFailed
            | WalErrorCode::CairnWalCorruption
            | WalErrorCode::CairnWalPoisoned => Severity::Fatal,
        }
    }
}

impl fmt::Display for WalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// WAL error type with context
#[derive(Debug)]
pub struct WalError {
    code: WalErrorCode,
    message: String,
    /// Position information (line number, byte offset)
    details: Option<String>,
    source: Option<io::Error>,
}

impl WalError {
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: WalErrorCode::CairnWalIo,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    pub fn append_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: WalErrorCode::CairnWalAppendFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    pub fn fsync_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: WalErrorCode::CairnWalFsyncFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        Self {
            code: WalErrorCode::CairnWalCorruption,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Append refused because an earlier failed append is still on disk
    pub fn poisoned(path: &std::path::Path) -> Self {
        Self {
            code: WalErrorCode::CairnWalPoisoned,
            message: format!(
                "WAL {} holds an unrolled failed append; checkpoint to recover",
                path.display()
            ),
            details: None,
            source: None,
        }
    }

    /// Corruption error with line and byte offset context
    pub fn corruption_at_line(line: u64, offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: WalErrorCode::CairnWalCorruption,
            message: reason.into(),
            details: Some(format!("line: {}, byte_offset: {}", line, offset)),
            source: None,
        }
    }

    pub fn code(&self) -> WalErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Returns true if the log content itself is malformed
    pub fn is_corruption(&self) -> bool {
        self.code == WalErrorCode::CairnWalCorruption
    }
}

impl fmt::Display for WalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for WalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for WAL operations
pub type WalResult<T> = Result<T, WalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_levels() {
        assert_eq!(WalErrorCode::CairnWalAppendFailed.severity(), Severity::Error);
        assert_eq!(WalErrorCode::CairnWalIo.severity(), Severity::Error);
        assert_eq!(WalErrorCode::CairnWalFsyncFailed.severity(), Severity::Fatal);
        assert_eq!(WalErrorCode::CairnWalCorruption.severity(), Severity::Fatal);
        assert_eq!(WalErrorCode::CairnWalPoisoned.severity(), Severity::Fatal);
    }

    #[test]
    fn test_fsync_failed_is_fatal() {
        let err = WalError::fsync_failed("fsync failed", io::Error::new(io::ErrorKind::Other, "disk error"));
        assert!(err.is_fatal());
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_error_display_contains_position() {
        let err = WalError::corruption_at_line(3, 120, "invalid JSON");
        let display = format!("{}", err);
        assert!(display.contains("[FATAL] CAIRN_WAL_CORRUPTION"));
        assert!(display.contains("invalid JSON"));
        assert!(display.contains("line: 3, byte_offset: 120"));
        assert!(err.is_corruption());
    }
}
