//! Document representation and field path resolution

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Document identifier type
pub type DocumentId = u64;

/// Largest identifier a `Value::Number` holds exactly (2^53 - 1)
pub const MAX_DOCUMENT_ID: DocumentId = (1 << 53) - 1;

/// Reserved identifier field
pub const ID_FIELD: &str = "_id";
/// Reserved creation timestamp field
pub const CREATED_AT_FIELD: &str = "_createdAt";
/// Reserved last-mutation timestamp field
pub const UPDATED_AT_FIELD: &str = "_updatedAt";

/// Errors produced when converting external data into documents
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("document must be a mapping, got {0}")]
    NotAMapping(&'static str),
}

/// A schema-less record: string-keyed fields mapped to values.
///
/// Keys are kept in sorted order so serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    /// Creates an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from a JSON object.
    pub fn from_json(json: serde_json::Value) -> Result<Self, DocumentError> {
        match Value::from(json) {
            Value::Mapping(fields) => Ok(Self { fields }),
            other => Err(DocumentError::NotAMapping(other.kind())),
        }
    }

    /// Converts to a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        Value::Mapping(self.fields.clone()).into()
    }

    /// Returns the `_id` if present and a valid identifier
    pub fn id(&self) -> Option<DocumentId> {
        self.fields.get(ID_FIELD).and_then(Value::as_u64)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolves a dotted field path such as `address.city`.
    ///
    /// Returns `None` if any segment is missing or an intermediate value is
    /// not a mapping. Empty paths and empty segments never resolve.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next().filter(|s| !s.is_empty())?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            if segment.is_empty() {
                return None;
            }
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }
}

impl TryFrom<serde_json::Value> for Document {
    type Error = DocumentError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Document::from_json(json)
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
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

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert_eq!(
            Document::from_json(json!([1, 2])),
            Err(DocumentError::NotAMapping("sequence"))
        );
        assert_eq!(
            Document::from_json(json!(null)),
            Err(DocumentError::NotAMapping("null"))
        );
    }

    #[test]
    fn test_id_requires_non_negative_integer() {
        assert_eq!(doc(json!({"_id": 5})).id(), Some(5));
        assert_eq!(doc(json!({"_id": "5"})).id(), None);
        assert_eq!(doc(json!({"_id": -5})).id(), None);
        assert_eq!(doc(json!({"name": "x"})).id(), None);
    }

    #[test]
    fn test_resolve_nested_path() {
        let d = doc(json!({"address": {"city": "Oslo", "geo": {"lat": 59.9}}}));
        assert_eq!(d.resolve("address.city"), Some(&Value::from("Oslo")));
        assert_eq!(d.resolve("address.geo.lat"), Some(&Value::from(59.9)));
    }

    #[test]
    fn test_resolve_missing_or_non_mapping_segment() {
        let d = doc(json!({"address": "Oslo", "name": "Alice"}));
        assert_eq!(d.resolve("address.city"), None);
        assert_eq!(d.resolve("missing.city"), None);
        assert_eq!(d.resolve(""), None);
        assert_eq!(d.resolve("name."), None);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let d = doc(json!({"b": 1, "a": "x"}));
        assert_eq!(serde_json::to_string(&d).unwrap(), r#"{"a":"x","b":1}"#);
    }
}
