//! Per-document evaluation errors
//!
//! These never escape a query: the executor counts them and treats the
//! document as non-matching.

/// Failure while evaluating a filter against one document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// The field path did not resolve
    #[error("field '{0}' is missing")]
    MissingField(String),

    /// Ordering comparison between incomparable values
    #[error("cannot compare {found} with {expected} at '{path}'")]
    TypeMismatch {
        path: String,
        found: &'static str,
        expected: &'static str,
    },

    /// A custom predicate returned an error
    #[error("predicate failed: {0}")]
    Predicate(String),

    /// A custom predicate panicked
    #[error("predicate panicked: {0}")]
    Panicked(String),
}

impl EvalError {
    /// Convenience constructor for predicate authors
    pub fn predicate(reason: impl Into<String>) -> Self {
        EvalError::Predicate(reason.into())
    }
}
