//! Startup recovery
//!
//! # Startup Sequence (strict order)
//!
//! 1. Load the snapshot, if one exists
//! 2. Replay the WAL from the first byte
//! 3. Restore the identifier counter
//! 4. Rebuild indexes (snapshot fields plus configured fields)
//!
//! State is built into fresh structures; nothing is served until every
//! step succeeded. Any corruption halts startup.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use crate::index::IndexManager;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::snapshot::{self, Snapshot};
use crate::store::DocumentStore;
use crate::wal::WalWriter;

use super::errors::{EngineError, EngineResult};
use super::replay::{ReplayStats, WalReplayer};

/// State reconstructed at open
#[derive(Debug)]
pub struct RecoveredState {
    pub store: DocumentStore,
    pub indexes: IndexManager,
    pub snapshot_documents: usize,
    pub replay: ReplayStats,
}

/// Rebuilds engine state from the snapshot at `snapshot_path` and the WAL.
pub fn recover(
    snapshot_path: Option<&Path>,
    wal: Option<&WalWriter>,
    configured_indexes: &[String],
) -> EngineResult<RecoveredState> {
    log_event(Event::RecoveryStart);

    let result = run(snapshot_path, wal, configured_indexes);
    if let Err(e) = &result {
        if let EngineError::Wal(wal_error) = e {
            if wal_error.is_corruption() {
                let details = wal_error.details().unwrap_or_default();
                log_event_with_fields(Event::WalCorruption, &[("details", details)]);
            }
        }
        let message = e.to_string();
        log_event_with_fields(Event::RecoveryFailed, &[("error", message.as_str())]);
    }
    result
}

fn run(
    snapshot_path: Option<&Path>,
    wal: Option<&WalWriter>,
    configured_indexes: &[String],
) -> EngineResult<RecoveredState> {
    let mut store = DocumentStore::new();
    let mut index_fields: BTreeSet<String> = configured_indexes.iter().cloned().collect();

    let snapshot = match snapshot_path {
        Some(path) => read_snapshot(path)?,
        None => None,
    };
    let snapshot_documents = match snapshot {
        Some(snap) => {
            let count = snap.documents.len();
            for doc in snap.documents {
                store.restore(doc)?;
            }
            if let Some(next_id) = snap.next_id {
                store.set_next_id_floor(next_id);
            }
            index_fields.extend(snap.indexes);
            count
        }
        None => 0,
    };

    let replay = match wal {
        Some(wal) => {
            log_event(Event::RecoveryReplayBegin);
            let stats = WalReplayer::replay(wal.read_all_entries()?, &mut store)?;
            let records = stats.records_replayed.to_string();
            log_event_with_fields(Event::RecoveryReplayComplete, &[("records", records.as_str())]);
            stats
        }
        None => ReplayStats::default(),
    };

    log_event(Event::RecoveryIndexRebuildBegin);
    let mut indexes = IndexManager::new();
    for field in &index_fields {
        indexes.create_index(field, store.iter())?;
    }
    let count = indexes.len().to_string();
    log_event_with_fields(Event::RecoveryIndexRebuildComplete, &[("indexes", count.as_str())]);

    info!(
        target: "cairndb::engine",
        snapshot_documents,
        replayed = replay.records_replayed,
        documents = store.len(),
        next_id = store.next_id(),
        "recovery complete"
    );

    Ok(RecoveredState {
        store,
        indexes,
        snapshot_documents,
        replay,
    })
}

fn read_snapshot(path: &Path) -> EngineResult<Option<Snapshot>> {
    match snapshot::load(path) {
        Ok(snap) => {
            let documents = snap.documents.len().to_string();
            log_event_with_fields(Event::SnapshotLoaded, &[("documents", documents.as_str())]);
            Ok(Some(snap))
        }
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}
