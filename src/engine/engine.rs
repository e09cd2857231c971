//! The cairndb engine
//!
//! Owns the document store, the index manager and (when durable) the WAL
//! writer, and sequences every mutation across them:
//!
//! 1. Validate and compute the post-mutation document (`prepare_*`)
//! 2. Append it to the WAL and fsync
//! 3. Commit it to the store
//! 4. Reflect it into the indexes
//!
//! A failure at step 1 or 2 leaves every structure untouched.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::executor::{ExecutionStats, QueryExecutor};
use crate::index::{IndexInfo, IndexManager, Lookup};
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::planner::{Filter, QueryPlan, QueryPlanner};
use crate::snapshot::{self, SaveOptions, SnapshotMeta};
use crate::store::{format_timestamp, DocumentStore};
use crate::value::{Document, DocumentId, Value};
use crate::wal::WalWriter;

use super::checkpoint::write_checkpoint;
use super::errors::{EngineError, EngineResult};
use super::recovery::recover;
use super::stats::EngineStats;

/// An embedded document store instance
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    store: DocumentStore,
    indexes: IndexManager,
    wal: Option<WalWriter>,
    /// WAL records not yet covered by a snapshot
    pending_records: u64,
    checkpoints: u64,
    last_checkpoint: Option<String>,
    recovered_entries: u64,
}

impl Engine {
    /// Opens an engine, recovering any state found in the data directory.
    ///
    /// No request is served until the snapshot is loaded, the WAL replayed
    /// and every index rebuilt.
    pub fn open(config: EngineConfig) -> EngineResult<Self> {
        log_event(Event::BootStart);
        config.validate()?;
        let data_dir = config
            .data_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());
        log_event_with_fields(Event::ConfigLoaded, &[("data_dir", data_dir.as_str())]);

        config.ensure_data_dir()?;

        let wal = match &config.data_dir {
            Some(dir) if config.wal_enabled => Some(WalWriter::open(dir)?),
            _ => None,
        };

        let snapshot_path = config.snapshot_path();
        let state = recover(snapshot_path.as_deref(), wal.as_ref(), &config.indexes)?;

        let engine = Self {
            store: state.store,
            indexes: state.indexes,
            wal,
            pending_records: state.replay.records_replayed,
            checkpoints: 0,
            last_checkpoint: None,
            recovered_entries: state.replay.records_replayed,
            config,
        };

        let documents = engine.store.len().to_string();
        log_event_with_fields(Event::BootComplete, &[("documents", documents.as_str())]);
        Ok(engine)
    }

    /// Creates a volatile engine with no data directory.
    pub fn in_memory() -> Self {
        Self {
            config: EngineConfig::in_memory(),
            store: DocumentStore::new(),
            indexes: IndexManager::new(),
            wal: None,
            pending_records: 0,
            checkpoints: 0,
            last_checkpoint: None,
            recovered_entries: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    /// Inserts a document and returns the stored copy with `_id` and
    /// timestamps assigned.
    pub fn insert(&mut self, doc: Document) -> EngineResult<Document> {
        let prepared = self.store.prepare_insert(doc)?;
        if let Some(wal) = self.wal.as_mut() {
            wal.log_insert(&prepared)?;
            self.pending_records += 1;
        }
        self.store.commit_insert(prepared.clone())?;
        self.indexes.on_insert(&prepared);
        self.maybe_checkpoint();
        Ok(prepared)
    }

    /// Inserts each document independently; earlier successes are kept when
    /// a later document fails.
    pub fn insert_many(&mut self, docs: Vec<Document>) -> Vec<EngineResult<Document>> {
        docs.into_iter().map(|doc| self.insert(doc)).collect()
    }

    /// Merges `patch` into every matching document. Returns the count.
    ///
    /// The patch is validated against every match before anything is
    /// written, so a rejected patch changes nothing.
    pub fn update(&mut self, filter: &Filter, patch: &Document) -> EngineResult<usize> {
        let ids = self.matching_ids(filter, None)?;
        self.update_ids(&ids, patch)
    }

    /// Updates the first matching document. Returns false if none matched.
    pub fn update_one(&mut self, filter: &Filter, patch: &Document) -> EngineResult<bool> {
        let ids = self.matching_ids(filter, Some(1))?;
        Ok(self.update_ids(&ids, patch)? > 0)
    }

    /// Deletes every matching document. Returns the count.
    pub fn delete(&mut self, filter: &Filter) -> EngineResult<usize> {
        let ids = self.matching_ids(filter, None)?;
        self.delete_ids(&ids)
    }

    /// Deletes the first matching document. Returns false if none matched.
    pub fn delete_one(&mut self, filter: &Filter) -> EngineResult<bool> {
        let ids = self.matching_ids(filter, Some(1))?;
        Ok(self.delete_ids(&ids)? > 0)
    }

    /// Removes every document. Each removal is logged, so replay reaches the
    /// same empty state. Identifiers are not recycled.
    pub fn clear(&mut self) -> EngineResult<usize> {
        let ids: Vec<DocumentId> = self.store.iter().filter_map(Document::id).collect();
        let removed = self.delete_ids(&ids)?;

        let count = removed.to_string();
        log_event_with_fields(Event::CollectionCleared, &[("documents", count.as_str())]);
        Ok(removed)
    }

    fn update_ids(&mut self, ids: &[DocumentId], patch: &Document) -> EngineResult<usize> {
        let mut prepared = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(updated) = self.store.prepare_update(*id, patch)? {
                prepared.push((*id, updated));
            }
        }

        for (id, updated) in &prepared {
            if let Some(wal) = self.wal.as_mut() {
                wal.log_update(*id, updated)?;
                self.pending_records += 1;
            }
            if let Some(old) = self.store.commit(updated.clone())? {
                self.indexes.on_update(&old, updated);
            } else {
                self.indexes.on_insert(updated);
            }
        }

        self.maybe_checkpoint();
        Ok(prepared.len())
    }

    fn delete_ids(&mut self, ids: &[DocumentId]) -> EngineResult<usize> {
        let mut removed = 0;
        for id in ids {
            if !self.store.contains(*id) {
                continue;
            }
            if let Some(wal) = self.wal.as_mut() {
                wal.log_delete(*id)?;
                self.pending_records += 1;
            }
            if let Some(old) = self.store.remove(*id) {
                self.indexes.on_delete(&old);
                removed += 1;
            }
        }

        self.maybe_checkpoint();
        Ok(removed)
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Returns copies of every matching document in ascending `_id` order.
    pub fn query(&self, filter: &Filter) -> EngineResult<Vec<Document>> {
        let ids = self.matching_ids(filter, None)?;
        Ok(self.documents_for(&ids))
    }

    /// Runs a query and also returns its plan and execution statistics.
    pub fn query_with_stats(
        &self,
        filter: &Filter,
        limit: Option<usize>,
    ) -> EngineResult<(Vec<Document>, QueryPlan, ExecutionStats)> {
        let (ids, plan, stats) = self.execute(filter, limit)?;
        Ok((self.documents_for(&ids), plan, stats))
    }

    /// Returns the first matching document
    pub fn find_one(&self, filter: &Filter) -> EngineResult<Option<Document>> {
        let ids = self.matching_ids(filter, Some(1))?;
        Ok(ids.first().and_then(|id| self.store.get(*id)))
    }

    /// Counts documents; `None` counts the whole collection.
    pub fn count(&self, filter: Option<&Filter>) -> EngineResult<usize> {
        match filter {
            None => Ok(self.store.len()),
            Some(filter) => Ok(self.matching_ids(filter, None)?.len()),
        }
    }

    pub fn find_all(&self) -> Vec<Document> {
        self.store.all()
    }

    pub fn get(&self, id: DocumentId) -> Option<Document> {
        self.store.get(id)
    }

    /// Plans a query without executing it
    pub fn explain(&self, filter: &Filter) -> EngineResult<QueryPlan> {
        Ok(QueryPlanner::new(&self.indexes).plan(filter)?)
    }

    pub fn lookup_equal(&self, field: &str, value: &Value) -> Lookup {
        self.indexes.lookup_equal(field, value)
    }

    pub fn lookup_range(&self, field: &str, min: Option<&Value>, max: Option<&Value>) -> Lookup {
        self.indexes.lookup_range(field, min, max)
    }

    fn matching_ids(&self, filter: &Filter, limit: Option<usize>) -> EngineResult<Vec<DocumentId>> {
        Ok(self.execute(filter, limit)?.0)
    }

    fn execute(
        &self,
        filter: &Filter,
        limit: Option<usize>,
    ) -> EngineResult<(Vec<DocumentId>, QueryPlan, ExecutionStats)> {
        let plan = QueryPlanner::new(&self.indexes).plan(filter)?;
        let description = plan.describe();
        log_event_with_fields(Event::QueryPlanned, &[("plan", description.as_str())]);

        let result = QueryExecutor::new(&self.indexes, &self.store).execute(&plan, filter, limit);
        debug!(
            target: "cairndb::engine",
            event = Event::QueryExecuted.as_str(),
            scan = result.stats.scan_type.as_str(),
            examined = result.stats.examined,
            matched = result.stats.matched,
            evaluation_errors = result.stats.evaluation_errors,
            "query executed"
        );
        Ok((result.ids, plan, result.stats))
    }

    fn documents_for(&self, ids: &[DocumentId]) -> Vec<Document> {
        ids.iter().filter_map(|id| self.store.get(*id)).collect()
    }

    // ---------------------------------------------------------------------
    // Indexes
    // ---------------------------------------------------------------------

    /// Creates (or rebuilds) an index on `field`.
    ///
    /// Index definitions are persisted with the next checkpoint; fields
    /// listed in the configuration are indexed on every open.
    pub fn create_index(&mut self, field: &str) -> EngineResult<IndexInfo> {
        let info = self.indexes.create_index(field, self.store.iter())?;
        let entries = info.entries.to_string();
        log_event_with_fields(
            Event::IndexCreated,
            &[("field", field), ("entries", entries.as_str())],
        );
        Ok(info)
    }

    /// Drops an index. Returns false if it did not exist.
    pub fn drop_index(&mut self, field: &str) -> bool {
        let dropped = self.indexes.drop_index(field);
        if dropped {
            log_event_with_fields(Event::IndexDropped, &[("field", field)]);
        }
        dropped
    }

    pub fn index_info(&self) -> Vec<IndexInfo> {
        self.indexes.describe()
    }

    // ---------------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------------

    /// Writes every document to a snapshot file at `path`.
    pub fn save_to_file(&self, path: &Path) -> EngineResult<SnapshotMeta> {
        let options = SaveOptions {
            next_id: Some(self.store.next_id()),
            indexes: self.indexes.fields(),
        };
        Ok(snapshot::save(self.store.iter(), path, &options)?)
    }

    /// Replaces every document with the contents of the snapshot at `path`.
    ///
    /// The snapshot is validated into fresh structures first; on a
    /// validation error the engine is unchanged.
    ///
    /// A durable engine first folds its WAL into a checkpoint of the current
    /// state, so no older record can replay over the loaded one, then writes
    /// the loaded state as the new snapshot. If that write fails after the
    /// snapshot was renamed into place, the loaded state is swapped in anyway
    /// (memory follows disk) and the error is still returned.
    pub fn load_from_file(&mut self, path: &Path) -> EngineResult<usize> {
        let snap = snapshot::load(path)?;

        let mut store = DocumentStore::new();
        for doc in snap.documents {
            store.restore(doc)?;
        }
        store.set_next_id_floor(self.store.next_id());
        if let Some(next_id) = snap.next_id {
            store.set_next_id_floor(next_id);
        }

        let mut indexes = IndexManager::new();
        let mut fields = self.indexes.fields();
        fields.extend(snap.indexes);
        fields.sort();
        fields.dedup();
        for field in &fields {
            indexes.create_index(field, store.iter())?;
        }

        if let Some(snapshot_path) = self.config.snapshot_path() {
            if self.pending_records > 0 || self.wal.as_ref().is_some_and(WalWriter::is_poisoned) {
                self.checkpoint()?;
            }
            // The WAL is empty here, so only the snapshot write can fail
            if let Err(e) = write_checkpoint(&store, &indexes, &snapshot_path, None) {
                if matches!(&e, EngineError::Snapshot(s) if s.is_committed()) {
                    self.store = store;
                    self.indexes = indexes;
                }
                return Err(e);
            }
            self.record_checkpoint();
        }

        self.store = store;
        self.indexes = indexes;

        let count = self.store.len();
        let documents = count.to_string();
        let source = path.display().to_string();
        log_event_with_fields(
            Event::LoadComplete,
            &[("path", source.as_str()), ("documents", documents.as_str())],
        );
        Ok(count)
    }

    /// Writes the current state to the data directory snapshot and clears
    /// the WAL.
    pub fn checkpoint(&mut self) -> EngineResult<SnapshotMeta> {
        let path = self.require_snapshot_path()?;
        let meta = write_checkpoint(&self.store, &self.indexes, &path, self.wal.as_mut())?;
        self.record_checkpoint();
        Ok(meta)
    }

    fn require_snapshot_path(&self) -> EngineResult<PathBuf> {
        self.config
            .snapshot_path()
            .ok_or_else(|| EngineError::validation("in-memory engine has no data directory to checkpoint"))
    }

    fn record_checkpoint(&mut self) {
        self.pending_records = 0;
        self.checkpoints += 1;
        self.last_checkpoint = Some(format_timestamp(chrono::Utc::now()));
    }

    /// Checkpoints once `checkpoint_interval` records are pending.
    ///
    /// The triggering mutation is already durable in the WAL, so a failed
    /// automatic checkpoint is logged and retried on the next write.
    fn maybe_checkpoint(&mut self) {
        let interval = self.config.checkpoint_interval;
        if self.wal.is_none() || interval == 0 || self.pending_records < interval {
            return;
        }
        if let Err(e) = self.checkpoint() {
            warn!(
                target: "cairndb::engine",
                error = %e,
                pending = self.pending_records,
                "automatic checkpoint failed"
            );
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    pub fn stats(&self) -> EngineStats {
        let indexes = self.indexes.describe();
        EngineStats {
            document_count: self.store.len(),
            index_count: indexes.len(),
            indexes,
            next_id: self.store.next_id(),
            wal_enabled: self.wal.is_some(),
            wal_records_since_checkpoint: self.pending_records,
            checkpoints: self.checkpoints,
            last_checkpoint: self.last_checkpoint.clone(),
            recovered_entries: self.recovered_entries,
            data_dir: self.config.data_dir.clone(),
        }
    }

    /// Closes the engine, checkpointing first when configured to.
    pub fn close(mut self) -> EngineResult<()> {
        log_event(Event::ShutdownStart);
        if self.config.checkpoint_on_close && self.config.snapshot_path().is_some() {
            self.checkpoint()?;
        } else if let Some(wal) = &self.wal {
            wal.fsync()?;
        }
        log_event(Event::ShutdownComplete);
        Ok(())
    }
}
