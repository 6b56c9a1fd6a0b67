//! Document collection gateway.
//!
//! # Responsibility
//! - Define the list/insert/delete contract the controller depends on.
//! - Provide a SQLite-backed collection implementing that contract.
//!
//! # Invariants
//! - Every call either completes or fails; no retries are layered here.
//! - Ordered listings omit documents that lack a `createdAt` timestamp.
//! - Inserts resolve every `ServerTimestamp` marker before persisting.

use crate::db::DbError;
use crate::model::document::{Document, DocumentFields, DocumentId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sqlite_collection;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a collection call.
///
/// Callers surface all variants the same way; the split exists for logs
/// and tests.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound(DocumentId),
    Encoding(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::Encoding(message) => write!(f, "invalid document encoding: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Encoding(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encoding(value.to_string())
    }
}

/// Direction of the `createdAt` ordering for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

/// Remote collection of documents addressed by opaque ids.
pub trait DocumentCollection {
    /// Returns every document ordered by `createdAt`.
    fn list(&self, order: SortOrder) -> StoreResult<Vec<Document>>;
    /// Persists a new document and returns its assigned id.
    fn insert(&self, fields: &DocumentFields) -> StoreResult<DocumentId>;
    /// Removes one document; `NotFound` when the id is unknown.
    fn delete_by_id(&self, id: &DocumentId) -> StoreResult<()>;
}
