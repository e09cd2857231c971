//! Hash-bucket index for a single field path
//!
//! Buckets map an `IndexKey` to the set of document ids holding that value.
//! Buckets are unordered by value, so equality is a hash lookup while a range
//! lookup visits every distinct key. Callers that need ordered range scans at
//! scale need a different structure; this one trades that for cheap
//! maintenance.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::value::{DocumentId, Value};

use super::key::IndexKey;

/// Secondary index over one field path
#[derive(Debug, Clone)]
pub struct FieldIndex {
    field: String,
    buckets: HashMap<IndexKey, BTreeSet<DocumentId>>,
    entries: usize,
    created_at: DateTime<Utc>,
}

impl FieldIndex {
    /// Creates an empty index
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            buckets: HashMap::new(),
            entries: 0,
            created_at: Utc::now(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Adds an id under a key. Idempotent.
    pub fn insert(&mut self, key: IndexKey, id: DocumentId) {
        if self.buckets.entry(key).or_default().insert(id) {
            self.entries += 1;
        }
    }

    /// Removes an id from a key. Empty buckets are dropped.
    pub fn remove(&mut self, key: &IndexKey, id: DocumentId) {
        if let Some(ids) = self.buckets.get_mut(key) {
            if ids.remove(&id) {
                self.entries -= 1;
            }
            if ids.is_empty() {
                self.buckets.remove(key);
            }
        }
    }

    /// Ids holding exactly this key
    pub fn lookup_eq(&self, key: &IndexKey) -> BTreeSet<DocumentId> {
        self.buckets.get(key).cloned().unwrap_or_default()
    }

    /// Ids whose key lies within the inclusive bounds.
    ///
    /// O(number of distinct keys).
    pub fn lookup_range(&self, min: Option<&Value>, max: Option<&Value>) -> BTreeSet<DocumentId> {
        self.buckets
            .iter()
            .filter(|(key, _)| key.within(min, max))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Clears all buckets, keeping the definition
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.entries = 0;
    }

    /// Number of distinct indexed values
    pub fn distinct_values(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of (value, id) entries
    pub fn entries(&self) -> usize {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(v: impl Into<Value>) -> IndexKey {
        IndexKey::from_value(&v.into()).unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut index = FieldIndex::new("name");
        index.insert(key("alice"), 1);
        index.insert(key("alice"), 2);
        index.insert(key("bob"), 3);

        assert_eq!(index.lookup_eq(&key("alice")), BTreeSet::from([1, 2]));
        assert_eq!(index.lookup_eq(&key("bob")), BTreeSet::from([3]));
        assert!(index.lookup_eq(&key("carol")).is_empty());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut index = FieldIndex::new("n");
        index.insert(key(1), 7);
        index.insert(key(1), 7);
        assert_eq!(index.entries(), 1);
    }

    #[test]
    fn test_remove_drops_empty_bucket() {
        let mut index = FieldIndex::new("n");
        index.insert(key(1), 100);
        index.insert(key(1), 200);

        index.remove(&key(1), 100);
        assert_eq!(index.lookup_eq(&key(1)), BTreeSet::from([200]));

        index.remove(&key(1), 200);
        assert_eq!(index.distinct_values(), 0);
        assert_eq!(index.entries(), 0);

        // Removing something absent is a no-op
        index.remove(&key(1), 200);
        assert_eq!(index.entries(), 0);
    }

    #[test]
    fn test_lookup_range_inclusive() {
        let mut index = FieldIndex::new("age");
        for (id, age) in [(1, 20), (2, 25), (3, 30), (4, 35), (5, 40)] {
            index.insert(key(age), id);
        }
        index.insert(key("thirty"), 6);

        let ids = index.lookup_range(Some(&Value::from(25)), Some(&Value::from(35)));
        assert_eq!(ids, BTreeSet::from([2, 3, 4]));

        let ids = index.lookup_range(None, Some(&Value::from(20)));
        assert_eq!(ids, BTreeSet::from([1]));

        let ids = index.lookup_range(None, None);
        assert_eq!(ids.len(), 6);
    }
}
