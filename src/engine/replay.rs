//! WAL replay for recovery
//!
//! Entries are applied strictly in log order. Inserts and updates carry the
//! full post-mutation document and are applied as upserts; deletes remove
//! the document if present. Applying the same log twice yields the same
//! state, which is what makes a crash between snapshot write and WAL clear
//! harmless.

use crate::store::DocumentStore;
use crate::wal::{RecordType, WalEntry, WalResult};

use super::errors::{EngineError, EngineResult};

/// Something WAL entries can be applied to
pub trait StorageApply {
    fn apply_wal_entry(&mut self, entry: &WalEntry) -> EngineResult<()>;
}

impl StorageApply for DocumentStore {
    fn apply_wal_entry(&mut self, entry: &WalEntry) -> EngineResult<()> {
        match entry.record_type {
            RecordType::Insert | RecordType::Update => {
                let document = entry.document.clone().ok_or_else(|| {
                    EngineError::validation(format!(
                        "{} entry without a document",
                        entry.record_type.as_str()
                    ))
                })?;
                self.restore(document)?;
            }
            RecordType::Delete => {
                if let Some(id) = entry.id {
                    self.remove(id);
                    self.reserve_through(id);
                }
            }
        }
        Ok(())
    }
}

/// Statistics from WAL replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub records_replayed: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
}

/// Replays WAL entries sequentially
pub struct WalReplayer;

impl WalReplayer {
    /// Applies every entry in order. Aborts on the first read or apply
    /// error; entries applied before it stay applied.
    pub fn replay<W, S>(entries: W, storage: &mut S) -> EngineResult<ReplayStats>
    where
        W: IntoIterator<Item = WalResult<WalEntry>>,
        S: StorageApply,
    {
        let mut stats = ReplayStats::default();

        for entry in entries {
            let entry = entry?;
            storage.apply_wal_entry(&entry)?;

            stats.records_replayed += 1;
            match entry.record_type {
                RecordType::Insert => stats.inserts += 1,
                RecordType::Update => stats.updates += 1,
                RecordType::Delete => stats.deletes += 1,
            }
        }

        Ok(stats)
    }
}
