//! Query Executor subsystem for cairndb
//!
//! Consumes plans and produces deterministic results.
//!
//! # Invariants
//!
//! - Results are in ascending `_id` order regardless of access path
//! - Index-assisted and full-scan execution return identical ids
//! - A failing or panicking evaluation excludes one document, never the query

mod errors;
mod executor;
mod filters;
mod result;

pub use errors::EvalError;
pub use executor::{DocumentSource, IndexLookup, QueryExecutor};
pub use filters::FilterEvaluator;
pub use result::{ExecutionResult, ExecutionStats};
