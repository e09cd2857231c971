//! Snapshot companion metadata (`<snapshot>.meta`)
//!
//! ```json
//! {
//!   "format_version": "1.0",
//!   "size_bytes": 5120,
//!   "checksum": "crc32:deadbeef",
//!   "document_count": 42,
//!   "created_at": "2026-02-04T11:30:00.000000Z",
//!   "written_at": "2026-02-04T12:00:00.000000Z"
//! }
//! ```
//!
//! `created_at` is kept from the previous metadata when a snapshot path is
//! overwritten; `written_at` is the time of the latest save.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::checksum::checksum_of;
use super::errors::{SnapshotError, SnapshotResult};

const META_SUFFIX: &str = ".meta";

/// Path of the metadata file for a snapshot path
pub fn meta_path_for(snapshot_path: &Path) -> PathBuf {
    let mut name = OsString::from(snapshot_path.as_os_str());
    name.push(META_SUFFIX);
    PathBuf::from(name)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotMeta {
    pub format_version: String,
    pub size_bytes: u64,
    pub checksum: String,
    pub document_count: usize,
    pub created_at: String,
    pub written_at: String,
}

impl SnapshotMeta {
    /// Describes freshly serialized snapshot bytes.
    pub fn describe(
        bytes: &[u8],
        format_version: &str,
        document_count: usize,
        created_at: String,
        written_at: String,
    ) -> Self {
        Self {
            format_version: format_version.to_string(),
            size_bytes: bytes.len() as u64,
            checksum: checksum_of(bytes),
            document_count,
            created_at,
            written_at,
        }
    }

    pub fn to_json(&self) -> SnapshotResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::format(format!("Failed to serialize snapshot metadata: {}", e)))
    }

    pub fn from_json(json: &str) -> SnapshotResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| SnapshotError::format(format!("Failed to parse snapshot metadata: {}", e)))
    }

    /// Reads metadata if the file exists.
    pub fn read_if_present(path: &Path) -> SnapshotResult<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::io_error_at_path(path, e)),
        }
    }

    /// Checks snapshot bytes against this metadata.
    pub fn verify(&self, snapshot_path: &Path, bytes: &[u8]) -> SnapshotResult<()> {
        if self.size_bytes != bytes.len() as u64 {
            return Err(SnapshotError::checksum_mismatch(
                snapshot_path,
                &format!("{} bytes", self.size_bytes),
                &format!("{} bytes", bytes.len()),
            ));
        }
        let actual = checksum_of(bytes);
        if !self.checksum.eq_ignore_ascii_case(&actual) {
            return Err(SnapshotError::checksum_mismatch(snapshot_path, &self.checksum, &actual));
        }
        Ok(())
    }
}
