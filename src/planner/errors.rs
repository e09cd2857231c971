//! Planner error types
//!
//! Error codes:
//! - CAIRN_QUERY_INVALID_FILTER (REJECT)
//! - CAIRN_QUERY_UNKNOWN_OPERATOR (REJECT)

use std::fmt;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Malformed filter structure (empty path, wrong JSON shape)
    CairnQueryInvalidFilter,
    /// `$`-prefixed operator that is not recognised
    CairnQueryUnknownOperator,
}

impl PlannerErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::CairnQueryInvalidFilter => "CAIRN_QUERY_INVALID_FILTER",
            PlannerErrorCode::CairnQueryUnknownOperator => "CAIRN_QUERY_UNKNOWN_OPERATOR",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with context
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerError {
    code: PlannerErrorCode,
    message: String,
    /// Field path if applicable
    field: Option<String>,
}

impl PlannerError {
    /// Create an invalid filter error
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::CairnQueryInvalidFilter,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            code: PlannerErrorCode::CairnQueryInvalidFilter,
            message: format!("invalid field path '{}'", path),
            field: Some(path),
        }
    }

    /// Create an unknown operator error
    pub fn unknown_operator(op: &str) -> Self {
        Self {
            code: PlannerErrorCode::CairnQueryUnknownOperator,
            message: format!("unknown filter operator '{}'", op),
            field: None,
        }
    }

    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_format() {
        let err = PlannerError::invalid_path("a..b");
        let display = format!("{}", err);
        assert!(display.starts_with("[REJECT] CAIRN_QUERY_INVALID_FILTER"));
        assert_eq!(err.field(), Some("a..b"));
    }

    #[test]
    fn test_unknown_operator_code() {
        let err = PlannerError::unknown_operator("$regex");
        assert_eq!(err.code().code(), "CAIRN_QUERY_UNKNOWN_OPERATOR");
        assert!(err.message().contains("$regex"));
    }
}
