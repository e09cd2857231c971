//! Document store: identifier allocation and raw document mechanics
//!
//! The store owns every live document. It has no knowledge of indexes or the
//! WAL; the engine sequences those around the two-phase `prepare_*` / `commit`
//! calls so a mutation can be logged before it becomes visible.

use std::collections::BTreeMap;

use crate::value::{
    Document, DocumentId, Value, CREATED_AT_FIELD, ID_FIELD, MAX_DOCUMENT_ID, UPDATED_AT_FIELD,
};

use super::clock::{format_timestamp, parse_timestamp, MonotonicClock};
use super::errors::{StoreError, StoreResult};

/// In-memory document collection keyed by `_id`.
///
/// Iteration is always in ascending `_id` order.
#[derive(Debug)]
pub struct DocumentStore {
    documents: BTreeMap<DocumentId, Document>,
    /// Next identifier to allocate; never decreases
    next_id: DocumentId,
    clock: MonotonicClock,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Creates an empty store. Identifiers start at 1.
    pub fn new() -> Self {
        Self {
            documents: BTreeMap::new(),
            next_id: 1,
            clock: MonotonicClock::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.documents.contains_key(&id)
    }

    /// Identifier the next insert without `_id` will receive
    pub fn next_id(&self) -> DocumentId {
        self.next_id
    }

    /// Returns a copy of the document
    pub fn get(&self, id: DocumentId) -> Option<Document> {
        self.documents.get(&id).cloned()
    }

    /// Borrows a document without copying
    pub fn get_ref(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    /// Iterates live documents in ascending `_id` order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Copies of all live documents in ascending `_id` order
    pub fn all(&self) -> Vec<Document> {
        self.documents.values().cloned().collect()
    }

    /// Computes the stored form of a new document without storing it.
    ///
    /// Assigns `_id` when absent (a present `_id` is kept if it is a free,
    /// valid identifier) and stamps both timestamps. The identifier is
    /// reserved even if the document is never committed.
    ///
    /// Identifiers never exceed `MAX_DOCUMENT_ID`; past it two ids would
    /// share one stored number.
    pub fn prepare_insert(&mut self, mut doc: Document) -> StoreResult<Document> {
        let id = match doc.get(ID_FIELD) {
            None => {
                let id = self.next_id;
                if id > MAX_DOCUMENT_ID {
                    return Err(StoreError::invalid_id(format!(
                        "identifier space exhausted: next _id would exceed {}",
                        MAX_DOCUMENT_ID
                    )));
                }
                self.next_id += 1;
                id
            }
            Some(value) => {
                let id = value.as_u64().filter(|id| *id <= MAX_DOCUMENT_ID).ok_or_else(|| {
                    StoreError::invalid_id(format!(
                        "_id must be an integer between 0 and {}, got {}",
                        MAX_DOCUMENT_ID, value
                    ))
                })?;
                if self.documents.contains_key(&id) {
                    return Err(StoreError::duplicate_id(id));
                }
                self.reserve_through(id);
                id
            }
        };

        let stamp = format_timestamp(self.clock.now());
        doc.insert(ID_FIELD, id);
        doc.insert(CREATED_AT_FIELD, stamp.clone());
        doc.insert(UPDATED_AT_FIELD, stamp);
        Ok(doc)
    }

    /// Computes the post-update form of a document without storing it.
    ///
    /// Shallow merge: patch fields overwrite, absent fields are untouched.
    /// Returns `Ok(None)` if the document does not exist.
    pub fn prepare_update(&mut self, id: DocumentId, patch: &Document) -> StoreResult<Option<Document>> {
        let Some(current) = self.documents.get(&id) else {
            return Ok(None);
        };

        for field in [ID_FIELD, CREATED_AT_FIELD] {
            if let Some(value) = patch.get(field) {
                if current.get(field) != Some(value) {
                    return Err(StoreError::immutable_field(field, id));
                }
            }
        }

        let mut updated = current.clone();
        for (field, value) in patch.fields() {
            if field == UPDATED_AT_FIELD {
                continue;
            }
            updated.insert(field.clone(), value.clone());
        }
        updated.insert(UPDATED_AT_FIELD, format_timestamp(self.clock.now()));
        Ok(Some(updated))
    }

    /// Stores a prepared document, returning the version it replaced.
    pub fn commit(&mut self, doc: Document) -> StoreResult<Option<Document>> {
        let id = Self::committed_id(&doc)?;
        self.reserve_through(id);
        Ok(self.documents.insert(id, doc))
    }

    /// Stores a prepared new document. Never replaces a live document.
    pub fn commit_insert(&mut self, doc: Document) -> StoreResult<()> {
        let id = Self::committed_id(&doc)?;
        if self.documents.contains_key(&id) {
            return Err(StoreError::duplicate_id(id));
        }
        self.reserve_through(id);
        self.documents.insert(id, doc);
        Ok(())
    }

    fn committed_id(doc: &Document) -> StoreResult<DocumentId> {
        doc.id()
            .ok_or_else(|| StoreError::invalid_id("committed document has no valid _id"))
    }

    /// Inserts a document, returning the stored copy.
    pub fn insert(&mut self, doc: Document) -> StoreResult<Document> {
        let prepared = self.prepare_insert(doc)?;
        self.commit_insert(prepared.clone())?;
        Ok(prepared)
    }

    /// Inserts each document independently.
    ///
    /// Not atomic: a failure is reported in its slot and earlier insertions
    /// stay in place.
    pub fn insert_many(&mut self, docs: Vec<Document>) -> Vec<StoreResult<Document>> {
        docs.into_iter().map(|doc| self.insert(doc)).collect()
    }

    /// Merges a patch into a stored document. `Ok(None)` if not found.
    pub fn apply_update(&mut self, id: DocumentId, patch: &Document) -> StoreResult<Option<Document>> {
        let Some(updated) = self.prepare_update(id, patch)? else {
            return Ok(None);
        };
        self.documents.insert(id, updated.clone());
        Ok(Some(updated))
    }

    /// Removes a document, returning it if it existed
    pub fn remove(&mut self, id: DocumentId) -> Option<Document> {
        self.documents.remove(&id)
    }

    /// Removes every document. Identifiers are not recycled.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    /// Upserts a document verbatim (replay and snapshot load).
    ///
    /// Advances the allocator and the clock past the document's identifier
    /// and timestamps.
    pub fn restore(&mut self, doc: Document) -> StoreResult<Option<Document>> {
        for field in [CREATED_AT_FIELD, UPDATED_AT_FIELD] {
            if let Some(ts) = doc.get(field).and_then(Value::as_str).and_then(parse_timestamp) {
                self.clock.observe(ts);
            }
        }
        self.commit(doc)
    }

    /// Ensures identifiers up to and including `id` are never allocated.
    pub fn reserve_through(&mut self, id: DocumentId) {
        self.next_id = self.next_id.max(id.saturating_add(1));
    }

    /// Raises the allocator to at least `next_id`.
    pub fn set_next_id_floor(&mut self, next_id: DocumentId) {
        self.next_id = self.next_id.max(next_id);
    }
}
