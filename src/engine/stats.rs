//! Engine statistics

use std::path::PathBuf;

use serde::Serialize;

use crate::index::IndexInfo;
use crate::value::DocumentId;

/// Point-in-time view of engine state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub document_count: usize,
    pub index_count: usize,
    pub indexes: Vec<IndexInfo>,
    /// Identifier the next insert will receive
    pub next_id: DocumentId,
    pub wal_enabled: bool,
    /// WAL records not yet folded into a snapshot
    pub wal_records_since_checkpoint: u64,
    /// Checkpoints taken since open
    pub checkpoints: u64,
    /// Timestamp of the latest checkpoint since open
    pub last_checkpoint: Option<String>,
    /// WAL entries replayed during open
    pub recovered_entries: u64,
    pub data_dir: Option<PathBuf>,
}
