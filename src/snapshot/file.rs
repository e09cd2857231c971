//! Snapshot save and load
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "timestamp": "2026-02-04T12:00:00.000000Z",
//!   "document_count": 2,
//!   "next_id": 3,
//!   "indexes": ["age"],
//!   "documents": [{"_id": 1, ...}, {"_id": 2, ...}]
//! }
//! ```
//!
//! Save order:
//! 1. Serialize the snapshot
//! 2. Write and fsync a temporary sibling, rename it over the target
//! 3. Same for `<path>.meta`
//! 4. fsync the parent directory
//!
//! The snapshot `timestamp` and the metadata `written_at` are the same
//! string, which pairs a snapshot with the metadata written for it. If a
//! crash lands between the two renames the metadata is stale; load detects
//! the unpaired timestamp and skips verification with a warning.
//!
//! An error raised after the snapshot rename is flagged `is_committed()`:
//! the target already holds the new content.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value as Json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::store::format_timestamp;
use crate::value::{Document, DocumentId};

use super::errors::{SnapshotError, SnapshotResult};
use super::meta::{meta_path_for, SnapshotMeta};

/// Format version written by this build
pub const SNAPSHOT_VERSION: &str = "1.0";
/// Major version accepted on load
const SUPPORTED_MAJOR: &str = "1";

/// Extra state persisted alongside the documents
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Next identifier to allocate
    pub next_id: Option<DocumentId>,
    /// Indexed field paths
    pub indexes: Vec<String>,
}

/// A loaded, validated snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: String,
    pub timestamp: Option<String>,
    pub next_id: Option<DocumentId>,
    pub indexes: Vec<String>,
    /// Documents in file order, each with a unique integer `_id`
    pub documents: Vec<Document>,
}

#[derive(Serialize)]
struct SnapshotBody<'a> {
    version: &'a str,
    timestamp: &'a str,
    document_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_id: Option<DocumentId>,
    indexes: &'a [String],
    documents: Vec<&'a Document>,
}

/// Writes a snapshot atomically and returns its metadata.
pub fn save<'a, I>(documents: I, path: &Path, options: &SaveOptions) -> SnapshotResult<SnapshotMeta>
where
    I: IntoIterator<Item = &'a Document>,
{
    let parent = parent_dir(path);
    fs::create_dir_all(&parent).map_err(|e| SnapshotError::io_error_at_path(&parent, e))?;

    let written_at = format_timestamp(Utc::now());
    let documents: Vec<&Document> = documents.into_iter().collect();
    let body = SnapshotBody {
        version: SNAPSHOT_VERSION,
        timestamp: &written_at,
        document_count: documents.len(),
        next_id: options.next_id,
        indexes: &options.indexes,
        documents,
    };
    let bytes = serde_json::to_vec_pretty(&body)
        .map_err(|e| SnapshotError::format(format!("Failed to serialize snapshot: {}", e)))?;

    let meta_path = meta_path_for(path);
    // An unreadable previous meta only loses the original creation time
    let created_at = SnapshotMeta::read_if_present(&meta_path)
        .ok()
        .flatten()
        .map(|m| m.created_at)
        .unwrap_or_else(|| written_at.clone());
    let meta = SnapshotMeta::describe(&bytes, SNAPSHOT_VERSION, body.document_count, created_at, written_at);

    let meta_json = meta.to_json()?;

    write_atomic(path, &bytes)?;
    // From here on the target already holds the new snapshot
    write_atomic(&meta_path, meta_json.as_bytes()).map_err(SnapshotError::after_commit)?;
    fsync_dir(&parent).map_err(SnapshotError::after_commit)?;

    info!(
        target: "cairndb::snapshot",
        path = %path.display(),
        documents = meta.document_count,
        bytes = meta.size_bytes,
        checksum = %meta.checksum,
        "snapshot written"
    );
    Ok(meta)
}

/// Reads and validates a snapshot.
///
/// # Errors
///
/// - `CAIRN_SNAPSHOT_IO` if the file cannot be read
/// - `CAIRN_SNAPSHOT_FORMAT` for malformed content
/// - `CAIRN_SNAPSHOT_CHECKSUM_MISMATCH` if paired metadata disagrees
pub fn load(path: &Path) -> SnapshotResult<Snapshot> {
    let bytes = fs::read(path).map_err(|e| SnapshotError::io_error_at_path(path, e))?;
    let json: Json = serde_json::from_slice(&bytes)
        .map_err(|e| SnapshotError::format(format!("{} is not valid JSON: {}", path.display(), e)))?;
    let root = json
        .as_object()
        .ok_or_else(|| SnapshotError::format("snapshot root must be an object"))?;

    let timestamp = match root.get("timestamp") {
        None | Some(Json::Null) => None,
        Some(Json::String(ts)) => Some(ts.clone()),
        Some(_) => return Err(SnapshotError::format("'timestamp' must be a string")),
    };

    if let Some(meta) = SnapshotMeta::read_if_present(&meta_path_for(path))? {
        if timestamp.as_deref() == Some(meta.written_at.as_str()) {
            meta.verify(path, &bytes)?;
        } else {
            warn!(
                target: "cairndb::snapshot",
                path = %path.display(),
                meta_written_at = %meta.written_at,
                snapshot_timestamp = ?timestamp,
                "snapshot metadata is stale; skipping checksum verification"
            );
        }
    }

    let version = match root.get("version") {
        Some(Json::String(v)) => v.clone(),
        Some(_) => return Err(SnapshotError::format("'version' must be a string")),
        None => return Err(SnapshotError::format("missing field 'version'")),
    };
    if version.split('.').next() != Some(SUPPORTED_MAJOR) {
        return Err(SnapshotError::format(format!(
            "unsupported snapshot version '{}'",
            version
        )));
    }

    let entries = match root.get("documents") {
        Some(Json::Array(entries)) => entries,
        Some(_) => return Err(SnapshotError::format("'documents' must be an array")),
        None => return Err(SnapshotError::format("missing field 'documents'")),
    };

    let mut seen = BTreeSet::new();
    let mut documents = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let doc = Document::from_json(entry.clone())
            .map_err(|e| SnapshotError::format(format!("document {}: {}", position, e)))?;
        let id = doc.id().ok_or_else(|| {
            SnapshotError::format(format!("document {} has no integer _id", position))
        })?;
        if !seen.insert(id) {
            return Err(SnapshotError::format(format!("duplicate _id {}", id)));
        }
        documents.push(doc);
    }

    if let Some(count) = root.get("document_count").filter(|v| !v.is_null()) {
        let count = count
            .as_u64()
            .ok_or_else(|| SnapshotError::format("'document_count' must be a non-negative integer"))?;
        if count != documents.len() as u64 {
            return Err(SnapshotError::format(format!(
                "document_count is {} but {} documents are present",
                count,
                documents.len()
            )));
        }
    }

    let next_id = match root.get("next_id") {
        None | Some(Json::Null) => None,
        Some(v) => Some(
            v.as_u64()
                .ok_or_else(|| SnapshotError::format("'next_id' must be a non-negative integer"))?,
        ),
    };

    let indexes = match root.get("indexes") {
        None | Some(Json::Null) => Vec::new(),
        Some(Json::Array(fields)) => fields
            .iter()
            .map(|f| {
                f.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| SnapshotError::format("'indexes' must contain strings"))
            })
            .collect::<SnapshotResult<_>>()?,
        Some(_) => return Err(SnapshotError::format("'indexes' must be an array")),
    };

    Ok(Snapshot {
        version,
        timestamp,
        next_id,
        indexes,
        documents,
    })
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Writes through a uniquely named temporary sibling, then renames.
fn write_atomic(path: &Path, bytes: &[u8]) -> SnapshotResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SnapshotError::format(format!("{} has no file name", path.display())))?;
    let tmp_path = parent_dir(path).join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let result = (|| {
        let mut file = File::create(&tmp_path).map_err(|e| SnapshotError::io_error_at_path(&tmp_path, e))?;
        file.write_all(bytes)
            .map_err(|e| SnapshotError::io_error_at_path(&tmp_path, e))?;
        file.sync_all()
            .map_err(|e| SnapshotError::io_error(format!("fsync failed for: {}", tmp_path.display()), e))?;
        fs::rename(&tmp_path, path).map_err(|e| SnapshotError::io_error_at_path(path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn fsync_dir(path: &Path) -> SnapshotResult<()> {
    let dir = File::open(path).map_err(|e| SnapshotError::io_error_at_path(path, e))?;
    dir.sync_all()
        .map_err(|e| SnapshotError::io_error(format!("fsync directory failed: {}", path.display()), e))
}
