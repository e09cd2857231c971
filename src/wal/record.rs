//! WAL record types
//!
//! One JSON object per line:
//!
//! ```text
//! {"type":"insert","timestamp":"...","document":{"_id":1,...}}
//! {"type":"update","timestamp":"...","id":1,"document":{"_id":1,...}}
//! {"type":"delete","timestamp":"...","id":1}
//! ```
//!
//! Insert and update records carry the full post-mutation document, never a
//! patch, so replay is an idempotent upsert.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::store::format_timestamp;
use crate::value::{Document, DocumentId};

/// WAL record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Insertion of a new document
    Insert,
    /// Replacement of an existing document (full document, not delta)
    Update,
    /// Removal of a document
    Delete,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Insert => "insert",
            RecordType::Update => "update",
            RecordType::Delete => "delete",
        }
    }
}

/// A single log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// RFC 3339 time the record was written
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}

impl WalEntry {
    pub fn insert(document: Document) -> Self {
        Self::new(RecordType::Insert, None, Some(document))
    }

    pub fn update(id: DocumentId, document: Document) -> Self {
        Self::new(RecordType::Update, Some(id), Some(document))
    }

    pub fn delete(id: DocumentId) -> Self {
        Self::new(RecordType::Delete, Some(id), None)
    }

    fn new(record_type: RecordType, id: Option<DocumentId>, document: Option<Document>) -> Self {
        Self {
            record_type,
            timestamp: format_timestamp(Utc::now()),
            id,
            document,
        }
    }

    /// Identifier the record applies to
    pub fn target_id(&self) -> Option<DocumentId> {
        match self.record_type {
            RecordType::Insert => self.document.as_ref().and_then(Document::id),
            RecordType::Update | RecordType::Delete => self.id,
        }
    }

    /// Checks the structural rules a record must satisfy to be replayed.
    pub fn validate(&self) -> Result<(), String> {
        let doc_id = match (&self.record_type, &self.document) {
            (RecordType::Insert | RecordType::Update, None) => {
                return Err(format!("{} record has no document", self.record_type.as_str()));
            }
            (RecordType::Insert | RecordType::Update, Some(doc)) => Some(
                doc.id()
                    .ok_or_else(|| format!("{} document has no integer _id", self.record_type.as_str()))?,
            ),
            (RecordType::Delete, _) => None,
        };

        match self.record_type {
            RecordType::Insert => Ok(()),
            RecordType::Update => match self.id {
                None => Err("update record has no id".to_string()),
                Some(id) if Some(id) != doc_id => {
                    Err(format!("update record id {} does not match document _id", id))
                }
                Some(_) => Ok(()),
            },
            RecordType::Delete => self
                .id
                .map(|_| ())
                .ok_or_else(|| "delete record has no id".to_string()),
        }
    }

    /// Serializes to a single line, newline included
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Parses and validates one line (without its newline)
    pub fn from_line(line: &str) -> Result<Self, String> {
        let entry: WalEntry = serde_json::from_str(line).map_err(|e| format!("invalid record: {}", e))?;
        entry.validate()?;
        Ok(entry)
    }
}
