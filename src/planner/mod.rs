//! Query Planner subsystem for cairndb
//!
//! Turns a `Filter` into a deterministic `QueryPlan`.
//!
//! # Index Selection Priority (strict order)
//!
//! 1. Indexed equality predicate
//! 2. Indexed range predicate
//! 3. Full scan
//!
//! Ties broken lexicographically by field name. Custom predicates, `Or`,
//! `Not`, `Ne` and null literals never drive index selection.

mod ast;
mod errors;
mod parse;
mod planner;

pub use ast::{CompareOp, Filter, Predicate};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult};
pub use planner::{AccessPath, IndexCatalog, QueryPlan, QueryPlanner, ScanType};
