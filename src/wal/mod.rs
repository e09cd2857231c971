//! Write-Ahead Log (WAL) subsystem for cairndb
//!
//! No acknowledged mutation exists unless it is persisted in the WAL.
//!
//! # Invariants Enforced
//!
//! - fsync before acknowledgment
//! - WAL append precedes every store write
//! - Records hold full post-mutation documents, so replay is idempotent
//! - Malformed records halt recovery; only an interrupted final append is
//!   tolerated

mod errors;
mod reader;
mod record;
mod writer;

pub use errors::{Severity, WalError, WalErrorCode, WalResult};
pub use reader::WalReader;
pub use record::{RecordType, WalEntry};
pub use writer::{WalWriter, WAL_DIR, WAL_FILE};
