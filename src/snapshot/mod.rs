//! Snapshot subsystem for cairndb
//!
//! A snapshot is a point-in-time JSON copy of every document plus the id
//! allocator and index definitions. Its `.meta` companion records size and
//! CRC32 so corruption is detected on load.
//!
//! # Invariants
//!
//! - A save either fully replaces the target or leaves it untouched
//! - A load either returns a fully validated snapshot or an error

mod checksum;
mod errors;
mod file;
mod meta;

pub use checksum::{checksum_of, compute_checksum, format_checksum, parse_checksum};
pub use errors::{SnapshotError, SnapshotErrorCode, SnapshotResult};
pub use file::{load, save, SaveOptions, Snapshot, SNAPSHOT_VERSION};
pub use meta::{meta_path_for, SnapshotMeta};
