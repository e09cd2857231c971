//! Document Store subsystem for cairndb
//!
//! Owns the identifier → document map, allocates identifiers and stamps
//! timestamps. Has no index or WAL awareness.
//!
//! # Invariants
//!
//! - No two live documents share an `_id`
//! - A deleted `_id` is never reallocated
//! - `_id` and `_createdAt` never change after insert
//! - `_updatedAt` never decreases

mod clock;
mod errors;
mod store;

pub use clock::{format_timestamp, parse_timestamp, MonotonicClock};
pub use errors::{StoreError, StoreErrorCode, StoreResult};
pub use store::DocumentStore;
