//! Checkpoint: fold the WAL into a snapshot
//!
//! Order (any failure aborts and leaves the WAL intact):
//!
//! 1. fsync the WAL
//! 2. Write the snapshot atomically (documents, `next_id`, index fields)
//! 3. Truncate the WAL and fsync its directory
//!
//! A crash after step 2 but before step 3 leaves a snapshot that already
//! contains every logged mutation; replaying the WAL over it is a no-op.

use std::path::Path;

use tracing::warn;

use crate::index::IndexManager;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::snapshot::{self, SaveOptions, SnapshotMeta};
use crate::store::DocumentStore;
use crate::wal::WalWriter;

use super::errors::EngineResult;

/// Writes a checkpoint of `store` to `snapshot_path` and clears `wal`.
pub fn write_checkpoint(
    store: &DocumentStore,
    indexes: &IndexManager,
    snapshot_path: &Path,
    wal: Option<&mut WalWriter>,
) -> EngineResult<SnapshotMeta> {
    log_event(Event::CheckpointStart);

    let result = run(store, indexes, snapshot_path, wal);
    match &result {
        Ok(meta) => {
            let path = snapshot_path.display().to_string();
            let documents = meta.document_count.to_string();
            log_event_with_fields(
                Event::CheckpointComplete,
                &[
                    ("path", path.as_str()),
                    ("documents", documents.as_str()),
                    ("checksum", meta.checksum.as_str()),
                ],
            );
        }
        Err(e) => {
            warn!(target: "cairndb::engine", error = %e, "checkpoint aborted; WAL left intact");
            log_event_with_fields(Event::CheckpointFailed, &[("code", e.code())]);
        }
    }
    result
}

fn run(
    store: &DocumentStore,
    indexes: &IndexManager,
    snapshot_path: &Path,
    mut wal: Option<&mut WalWriter>,
) -> EngineResult<SnapshotMeta> {
    if let Some(wal) = wal.as_deref_mut() {
        wal.fsync()?;
    }

    let options = SaveOptions {
        next_id: Some(store.next_id()),
        indexes: indexes.fields(),
    };
    let meta = snapshot::save(store.iter(), snapshot_path, &options)?;

    if let Some(wal) = wal {
        wal.clear()?;
        log_event(Event::WalTruncate);
    }
    Ok(meta)
}
