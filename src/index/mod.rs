//! Index Manager subsystem for cairndb
//!
//! Indexes are derived, in-memory-only state. They are rebuilt from the
//! document set after recovery or load and maintained incrementally after
//! every store mutation.
//!
//! # Invariants
//!
//! - A live document is in the bucket for its value at an indexed path iff
//!   that value exists and is non-null
//! - No bucket references a deleted identifier
//! - Updates occur AFTER store writes

mod bucket;
mod errors;
mod key;
mod manager;

pub use bucket::FieldIndex;
pub use errors::{IndexError, IndexErrorCode, IndexResult};
pub use key::IndexKey;
pub use manager::{validate_field, IndexInfo, IndexManager, Lookup};
