//! Store-side document representation.
//!
//! # Responsibility
//! - Describe what the document collection persists: an opaque id plus a
//!   field map.
//! - Provide the server-time marker resolved by the store at write time.
//!
//! # Invariants
//! - `FieldValue::ServerTimestamp` never appears in a document read back from
//!   a collection; stores replace it before persisting.

use crate::model::notification::NotificationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Store-native timestamp: Unix epoch milliseconds.
pub type StoreTimestamp = i64;

/// Field map of one document, keyed by field name.
pub type DocumentFields = BTreeMap<String, FieldValue>;

/// Opaque identifier addressing a document inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DocumentId> for NotificationId {
    fn from(value: DocumentId) -> Self {
        NotificationId::new(value.0)
    }
}

impl From<&NotificationId> for DocumentId {
    fn from(value: &NotificationId) -> Self {
        DocumentId::new(value.as_str())
    }
}

/// Value of a single document field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    String(String),
    Timestamp(StoreTimestamp),
    /// Placeholder for "current server time", resolved on write.
    ServerTimestamp,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<StoreTimestamp> {
        match self {
            Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }
}

/// A persisted document as returned by collection reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: DocumentFields,
}

impl Document {
    pub fn new(id: DocumentId, fields: DocumentFields) -> Self {
        Self { id, fields }
    }

    /// Looks up one field by name.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}
