//! Filter evaluation against a single document
//!
//! No type coercion: `1` never equals `"1"`. Ordering comparisons require
//! both sides to be numbers, both text, or both booleans.
//!
//! Combinators use three-valued logic so the outcome does not depend on the
//! order of sub-filters: a decisive result (`false` in `And`, `true` in `Or`)
//! wins over an error in a sibling, otherwise the first error propagates.

use std::any::Any;
use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};

use crate::planner::{CompareOp, Filter, Predicate};
use crate::value::{Document, Value};

use super::errors::EvalError;

/// Evaluates filters against documents
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Returns whether the document matches the filter.
    pub fn evaluate(doc: &Document, filter: &Filter) -> Result<bool, EvalError> {
        match filter {
            Filter::Compare { path, op, value } => Self::compare(doc, path, *op, value),
            Filter::And(items) => {
                let mut first_err = None;
                for item in items {
                    match Self::evaluate(doc, item) {
                        Ok(false) => return Ok(false),
                        Ok(true) => {}
                        Err(e) => {
                            first_err.get_or_insert(e);
                        }
                    }
                }
                first_err.map_or(Ok(true), Err)
            }
            Filter::Or(items) => {
                let mut first_err = None;
                for item in items {
                    match Self::evaluate(doc, item) {
                        Ok(true) => return Ok(true),
                        Ok(false) => {}
                        Err(e) => {
                            first_err.get_or_insert(e);
                        }
                    }
                }
                first_err.map_or(Ok(false), Err)
            }
            Filter::Not(inner) => Self::evaluate(doc, inner).map(|m| !m),
            Filter::Exists(path) => Ok(doc.resolve(path).is_some()),
            Filter::Custom(predicate) => Self::call_predicate(doc, predicate),
        }
    }

    fn compare(doc: &Document, path: &str, op: CompareOp, expected: &Value) -> Result<bool, EvalError> {
        let actual = doc
            .resolve(path)
            .ok_or_else(|| EvalError::MissingField(path.to_string()))?;

        let ordering = || {
            actual.compare(expected).ok_or_else(|| EvalError::TypeMismatch {
                path: path.to_string(),
                found: actual.kind(),
                expected: expected.kind(),
            })
        };

        match op {
            CompareOp::Eq => Ok(actual == expected),
            CompareOp::Ne => Ok(actual != expected),
            CompareOp::Gt => ordering().map(|o| o == Ordering::Greater),
            CompareOp::Gte => ordering().map(|o| o != Ordering::Less),
            CompareOp::Lt => ordering().map(|o| o == Ordering::Less),
            CompareOp::Lte => ordering().map(|o| o != Ordering::Greater),
        }
    }

    /// Runs a custom predicate, converting a panic into an error.
    fn call_predicate(doc: &Document, predicate: &Predicate) -> Result<bool, EvalError> {
        match panic::catch_unwind(AssertUnwindSafe(|| predicate.call(doc))) {
            Ok(result) => result,
            Err(payload) => Err(EvalError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
