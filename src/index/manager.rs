//! Index Manager for cairndb
//!
//! Maintains named secondary indexes in step with the document store.
//!
//! # API
//!
//! - `create_index(field, documents)` - Build (or rebuild) an index by full scan
//! - `drop_index(field)` - Discard an index
//! - `on_insert` / `on_update` / `on_delete` - Incremental maintenance
//! - `lookup_equal(field, value)` - Exact match lookup
//! - `lookup_range(field, min, max)` - Inclusive range lookup

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::store::format_timestamp;
use crate::value::{Document, DocumentId, Value};

use super::bucket::FieldIndex;
use super::errors::{IndexError, IndexResult};
use super::key::IndexKey;

/// Result of an index lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The field is indexed; these ids match (possibly none)
    Ids(BTreeSet<DocumentId>),
    /// The field has no index
    Unindexed,
}

impl Lookup {
    /// Returns the ids if the field was indexed
    pub fn ids(&self) -> Option<&BTreeSet<DocumentId>> {
        match self {
            Lookup::Ids(ids) => Some(ids),
            Lookup::Unindexed => None,
        }
    }

    pub fn into_ids(self) -> Option<BTreeSet<DocumentId>> {
        match self {
            Lookup::Ids(ids) => Some(ids),
            Lookup::Unindexed => None,
        }
    }

    pub fn is_unindexed(&self) -> bool {
        matches!(self, Lookup::Unindexed)
    }
}

/// Per-index metadata reported by `describe`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    /// Indexed field path
    pub field: String,
    /// Number of distinct indexed values
    pub distinct_values: usize,
    /// Number of indexed documents
    pub entries: usize,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// Validates an index field path.
pub fn validate_field(field: &str) -> IndexResult<()> {
    if field.trim().is_empty() {
        return Err(IndexError::invalid_field(field, "field name is empty"));
    }
    if field.split('.').any(str::is_empty) {
        return Err(IndexError::invalid_field(field, "path contains an empty segment"));
    }
    Ok(())
}

/// Index Manager that maintains in-memory secondary indexes
#[derive(Debug, Default)]
pub struct IndexManager {
    /// Indexes by field path, kept sorted for deterministic reporting
    indexes: BTreeMap<String, FieldIndex>,
}

impl IndexManager {
    /// Creates a manager with no indexes
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index on `field` by a full pass over `documents`.
    ///
    /// If the index already exists it is rebuilt from scratch, discarding
    /// any prior buckets.
    pub fn create_index<'a, I>(&mut self, field: &str, documents: I) -> IndexResult<IndexInfo>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        validate_field(field)?;

        let mut index = FieldIndex::new(field);
        for doc in documents {
            if let Some((key, id)) = Self::entry_for(doc, field) {
                index.insert(key, id);
            }
        }

        let info = Self::info_for(&index);
        self.indexes.insert(field.to_string(), index);
        Ok(info)
    }

    /// Drops an index. Returns false if it did not exist.
    pub fn drop_index(&mut self, field: &str) -> bool {
        self.indexes.remove(field).is_some()
    }

    /// Rebuilds every existing index from `documents`.
    pub fn rebuild_all<'a, I>(&mut self, documents: I)
    where
        I: IntoIterator<Item = &'a Document>,
    {
        for index in self.indexes.values_mut() {
            index.clear();
        }
        for doc in documents {
            self.on_insert(doc);
        }
    }

    /// Reflects a newly stored document into every index
    pub fn on_insert(&mut self, doc: &Document) {
        for (field, index) in self.indexes.iter_mut() {
            if let Some((key, id)) = Self::entry_for(doc, field) {
                index.insert(key, id);
            }
        }
    }

    /// Removes a deleted document from every index
    pub fn on_delete(&mut self, doc: &Document) {
        for (field, index) in self.indexes.iter_mut() {
            if let Some((key, id)) = Self::entry_for(doc, field) {
                index.remove(&key, id);
            }
        }
    }

    /// Moves a document from its old entries to its new ones.
    ///
    /// Delete-then-insert inside one `&mut self` call: no caller can observe
    /// the state in between.
    pub fn on_update(&mut self, old: &Document, new: &Document) {
        self.on_delete(old);
        self.on_insert(new);
    }

    /// Ids whose value at `field` equals `value`.
    ///
    /// Null values are never indexed, so a null lookup on an indexed field
    /// yields an empty set.
    pub fn lookup_equal(&self, field: &str, value: &Value) -> Lookup {
        let Some(index) = self.indexes.get(field) else {
            return Lookup::Unindexed;
        };
        match IndexKey::from_value(value) {
            Some(key) => Lookup::Ids(index.lookup_eq(&key)),
            None => Lookup::Ids(BTreeSet::new()),
        }
    }

    /// Ids whose value at `field` lies within the inclusive bounds
    pub fn lookup_range(&self, field: &str, min: Option<&Value>, max: Option<&Value>) -> Lookup {
        match self.indexes.get(field) {
            Some(index) => Lookup::Ids(index.lookup_range(min, max)),
            None => Lookup::Unindexed,
        }
    }

    pub fn has_index(&self, field: &str) -> bool {
        self.indexes.contains_key(field)
    }

    /// Indexed field paths in sorted order
    pub fn fields(&self) -> Vec<String> {
        self.indexes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Metadata for every index, sorted by field
    pub fn describe(&self) -> Vec<IndexInfo> {
        self.indexes.values().map(Self::info_for).collect()
    }

    fn entry_for(doc: &Document, field: &str) -> Option<(IndexKey, DocumentId)> {
        let id = doc.id()?;
        let key = IndexKey::from_value(doc.resolve(field)?)?;
        Some((key, id))
    }

    fn info_for(index: &FieldIndex) -> IndexInfo {
        IndexInfo {
            field: index.field().to_string(),
            distinct_values: index.distinct_values(),
            entries: index.entries(),
            created_at: format_timestamp(index.created_at()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(json: serde_json::Value) -> Document {
        Document::from_json(json).unwrap()
    }

    fn people() -> Vec<Document> {
        vec![
            doc(json!({"_id": 1, "name": "Alice", "age": 30, "address": {"city": "Oslo"}})),
            doc(json!({"_id": 2, "name": "Bob", "age": 25, "address": {"city": "Bergen"}})),
            doc(json!({"_id": 3, "name": "Carol", "age": 30, "address": "unknown"})),
            doc(json!({"_id": 4, "name": "Dave", "age": null})),
        ]
    }

    fn ids(lookup: Lookup) -> Vec<DocumentId> {
        lookup.into_ids().unwrap().into_iter().collect()
    }

    #[test]
    fn test_create_index_builds_from_documents() {
        let docs = people();
        let mut manager = IndexManager::new();
        let info = manager.create_index("age", &docs).unwrap();

        assert_eq!(info.field, "age");
        assert_eq!(info.distinct_values, 2);
        assert_eq!(info.entries, 3);
        assert_eq!(ids(manager.lookup_equal("age", &Value::from(30))), vec![1, 3]);
    }

    #[test]
    fn test_null_and_absent_values_not_indexed() {
        let docs = people();
        let mut manager = IndexManager::new();
        manager.create_index("age", &docs).unwrap();

        assert!(ids(manager.lookup_equal("age", &Value::Null)).is_empty());
        let all = ids(manager.lookup_range("age", None, None));
        assert_eq!(all, vec![1, 2, 3]);
    }

    #[test]
    fn test_nested_path_skips_missing_segments() {
        let docs = people();
        let mut manager = IndexManager::new();
        let info = manager.create_index("address.city", &docs).unwrap();

        assert_eq!(info.entries, 2);
        assert_eq!(ids(manager.lookup_equal("address.city", &Value::from("Oslo"))), vec![1]);
        assert!(ids(manager.lookup_equal("address.city", &Value::from("unknown"))).is_empty());
    }

    #[test]
    fn test_unindexed_field_reports_unindexed() {
        let manager = IndexManager::new();
        assert!(manager.lookup_equal("age", &Value::from(1)).is_unindexed());
        assert!(manager.lookup_range("age", None, None).is_unindexed());
    }

    #[test]
    fn test_empty_field_name_rejected() {
        let mut manager = IndexManager::new();
        let docs: Vec<Document> = Vec::new();
        assert!(manager.create_index("", &docs).is_err());
        assert!(manager.create_index("a..b", &docs).is_err());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_incremental_maintenance() {
        let mut manager = IndexManager::new();
        let none: Vec<Document> = Vec::new();
        manager.create_index("age", &none).unwrap();

        let alice = doc(json!({"_id": 1, "age": 30}));
        manager.on_insert(&alice);
        assert_eq!(ids(manager.lookup_equal("age", &Value::from(30))), vec![1]);

        let older = doc(json!({"_id": 1, "age": 31}));
        manager.on_update(&alice, &older);
        assert!(ids(manager.lookup_equal("age", &Value::from(30))).is_empty());
        assert_eq!(ids(manager.lookup_equal("age", &Value::from(31))), vec![1]);

        manager.on_delete(&older);
        assert!(ids(manager.lookup_equal("age", &Value::from(31))).is_empty());
        assert_eq!(manager.describe()[0].entries, 0);
    }

    #[test]
    fn test_update_to_null_removes_entry() {
        let mut manager = IndexManager::new();
        let before = doc(json!({"_id": 1, "age": 30}));
        manager.create_index("age", [&before]).unwrap();

        let after = doc(json!({"_id": 1, "age": null}));
        manager.on_update(&before, &after);
        assert_eq!(manager.describe()[0].entries, 0);
    }

    #[test]
    fn test_drop_index() {
        let docs = people();
        let mut manager = IndexManager::new();
        manager.create_index("age", &docs).unwrap();

        assert!(manager.drop_index("age"));
        assert!(!manager.drop_index("age"));
        assert!(!manager.has_index("age"));
        assert!(manager.lookup_equal("age", &Value::from(30)).is_unindexed());
    }

    #[test]
    fn test_rebuild_heals_stale_entries() {
        let docs = people();
        let mut manager = IndexManager::new();
        manager.create_index("age", &docs).unwrap();

        // A stale entry for a document that no longer exists
        manager.on_insert(&doc(json!({"_id": 99, "age": 30})));
        assert_eq!(ids(manager.lookup_equal("age", &Value::from(30))), vec![1, 3, 99]);

        manager.create_index("age", &docs).unwrap();
        assert_eq!(ids(manager.lookup_equal("age", &Value::from(30))), vec![1, 3]);

        manager.on_insert(&doc(json!({"_id": 99, "age": 30})));
        manager.rebuild_all(&docs);
        assert_eq!(ids(manager.lookup_equal("age", &Value::from(30))), vec![1, 3]);
    }

    #[test]
    fn test_describe_sorted_by_field() {
        let docs = people();
        let mut manager = IndexManager::new();
        manager.create_index("name", &docs).unwrap();
        manager.create_index("age", &docs).unwrap();

        let fields: Vec<_> = manager.describe().into_iter().map(|i| i.field).collect();
        assert_eq!(fields, vec!["age", "name"]);
    }
}
