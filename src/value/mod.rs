//! Value model for cairndb
//!
//! Documents are string-keyed mappings of tagged `Value`s. Field paths are
//! dotted strings (`address.city`) resolved through nested mappings.

mod document;
mod value;

pub use document::{
    Document, DocumentError, DocumentId, CREATED_AT_FIELD, ID_FIELD, MAX_DOCUMENT_ID,
    UPDATED_AT_FIELD,
};
pub use value::Value;
