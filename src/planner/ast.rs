//! Filter expression tree
//!
//! A `Filter` is either a structured expression the planner can analyze
//! (comparisons, `Exists`, and/or/not combinators) or an opaque custom
//! predicate, which is only ever executed by full scan.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::executor::EvalError;
use crate::value::{Document, Value};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    /// field = value
    Eq,
    /// field != value
    Ne,
    /// field > value
    Gt,
    /// field >= value
    Gte,
    /// field < value
    Lt,
    /// field <= value
    Lte,
}

impl CompareOp {
    /// Returns the operation name for explain output
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
        }
    }

    /// Returns true for `Gt`, `Gte`, `Lt`, `Lte`
    pub fn is_range(&self) -> bool {
        matches!(self, CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte)
    }

    /// Returns true for `Gt` and `Gte`
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, CompareOp::Gt | CompareOp::Gte)
    }
}

type PredicateFn = dyn Fn(&Document) -> Result<bool, EvalError> + Send + Sync;

/// Opaque per-document predicate.
#[derive(Clone)]
pub struct Predicate {
    name: String,
    func: Arc<PredicateFn>,
}

impl Predicate {
    /// Wraps a fallible predicate
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Document) -> Result<bool, EvalError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the predicate. Panics are not caught here.
    pub fn call(&self, doc: &Document) -> Result<bool, EvalError> {
        (self.func)(doc)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Query filter
#[derive(Debug, Clone)]
pub enum Filter {
    /// Compare the value at a field path with a literal
    Compare {
        path: String,
        op: CompareOp,
        value: Value,
    },
    /// Every sub-filter matches (empty matches everything)
    And(Vec<Filter>),
    /// At least one sub-filter matches (empty matches nothing)
    Or(Vec<Filter>),
    /// The sub-filter does not match
    Not(Box<Filter>),
    /// The field path resolves to a value (null included)
    Exists(String),
    /// Opaque predicate, full scan only
    Custom(Predicate),
}

impl Filter {
    fn compare(path: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Filter::Compare {
            path: path.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Eq, value)
    }

    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Ne, value)
    }

    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Gt, value)
    }

    pub fn gte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Gte, value)
    }

    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Lt, value)
    }

    pub fn lte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Lte, value)
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Filter::Exists(path.into())
    }

    /// Matches every document
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    /// Infallible custom predicate
    pub fn predicate<F>(func: F) -> Self
    where
        F: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        Filter::Custom(Predicate::new("predicate", move |doc| Ok(func(doc))))
    }

    /// Fallible custom predicate; an `Err` makes the document non-matching
    pub fn try_predicate<F>(func: F) -> Self
    where
        F: Fn(&Document) -> Result<bool, EvalError> + Send + Sync + 'static,
    {
        Filter::Custom(Predicate::new("predicate", func))
    }

    /// Returns the conjuncts of a (possibly nested) top-level `And`
    pub fn conjuncts(&self) -> Vec<&Filter> {
        match self {
            Filter::And(items) => items.iter().flat_map(Filter::conjuncts).collect(),
            other => vec![other],
        }
    }

    /// Returns true if any part of the filter is a custom predicate
    pub fn has_custom_predicate(&self) -> bool {
        match self {
            Filter::Custom(_) => true,
            Filter::And(items) | Filter::Or(items) => items.iter().any(Filter::has_custom_predicate),
            Filter::Not(inner) => inner.has_custom_predicate(),
            Filter::Compare { .. } | Filter::Exists(_) => false,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Compare { path, op, value } => write!(f, "{} {} {}", path, op.as_str(), value),
            Filter::And(items) | Filter::Or(items) => {
                let joiner = if matches!(self, Filter::And(_)) { " and " } else { " or " };
                if items.is_empty() {
                    return write!(f, "{}", if matches!(self, Filter::And(_)) { "true" } else { "false" });
                }
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", joiner)?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Filter::Not(inner) => write!(f, "not {}", inner),
            Filter::Exists(path) => write!(f, "exists {}", path),
            Filter::Custom(pred) => write!(f, "<{}>", pred.name()),
        }
    }
}
