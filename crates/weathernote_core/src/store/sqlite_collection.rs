//! SQLite-backed document collection.
//!
//! # Responsibility
//! - Persist field maps as JSON rows scoped by collection name.
//! - Assign document ids and resolve server timestamps on insert.
//!
//! # Invariants
//! - `created_at` mirrors the resolved `createdAt` field, or NULL when the
//!   document has none.
//! - Equal `created_at` values order by insertion sequence, later first in
//!   descending listings.

use crate::model::codec::FIELD_CREATED_AT;
use crate::model::document::{Document, DocumentFields, DocumentId, FieldValue, StoreTimestamp};
use crate::store::{DocumentCollection, SortOrder, StoreError, StoreResult};
use chrono::Utc;
use log::{debug, error};
use rusqlite::{params, Connection};
use std::time::Instant;
use uuid::Uuid;

/// Collection used by the admin screen.
pub const DEFAULT_COLLECTION: &str = "weatherNotifications";

type ServerClock = Box<dyn Fn() -> StoreTimestamp + Send>;

/// Document collection stored in one SQLite table.
pub struct SqliteCollection {
    conn: Connection,
    collection: String,
    clock: ServerClock,
}

impl SqliteCollection {
    /// Wraps a migrated connection, using wall-clock server time.
    pub fn new(conn: Connection, collection: impl Into<String>) -> Self {
        Self::with_clock(conn, collection, || Utc::now().timestamp_millis())
    }

    /// Wraps a migrated connection with a caller-provided server clock.
    pub fn with_clock(
        conn: Connection,
        collection: impl Into<String>,
        clock: impl Fn() -> StoreTimestamp + Send + 'static,
    ) -> Self {
        Self {
            conn,
            collection: collection.into(),
            clock: Box::new(clock),
        }
    }

    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }

    /// Underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn list_inner(&self, order: SortOrder) -> StoreResult<Vec<Document>> {
        let sql = match order {
            SortOrder::Descending => {
                "SELECT id, fields_json FROM documents
                 WHERE collection = ?1 AND created_at IS NOT NULL
                 ORDER BY created_at DESC, seq DESC;"
            }
            SortOrder::Ascending => {
                "SELECT id, fields_json FROM documents
                 WHERE collection = ?1 AND created_at IS NOT NULL
                 ORDER BY created_at ASC, seq ASC;"
            }
        };

        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([self.collection.as_str()])?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            let id: String = row.get("id")?;
            let fields_json: String = row.get("fields_json")?;
            let fields: DocumentFields = serde_json::from_str(&fields_json).map_err(|err| {
                StoreError::Encoding(format!("document `{id}` has unreadable fields: {err}"))
            })?;
            documents.push(Document::new(DocumentId::new(id), fields));
        }

        Ok(documents)
    }

    fn insert_inner(&self, fields: &DocumentFields) -> StoreResult<DocumentId> {
        let server_now = (self.clock)();
        let resolved = resolve_server_timestamps(fields, server_now);
        let created_at = resolved
            .get(FIELD_CREATED_AT)
            .and_then(FieldValue::as_timestamp);
        let fields_json = serde_json::to_string(&resolved)?;
        let id = DocumentId::new(Uuid::new_v4().to_string());

        self.conn.execute(
            "INSERT INTO documents (collection, id, fields_json, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                self.collection.as_str(),
                id.as_str(),
                fields_json,
                created_at,
            ],
        )?;

        Ok(id)
    }

    fn delete_inner(&self, id: &DocumentId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![self.collection.as_str(), id.as_str()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

impl DocumentCollection for SqliteCollection {
    fn list(&self, order: SortOrder) -> StoreResult<Vec<Document>> {
        let started_at = Instant::now();
        let result = self.list_inner(order);
        log_call("list", started_at, &result, |docs: &Vec<Document>| docs.len());
        result
    }

    fn insert(&self, fields: &DocumentFields) -> StoreResult<DocumentId> {
        let started_at = Instant::now();
        let result = self.insert_inner(fields);
        log_call("insert", started_at, &result, |_| 1);
        result
    }

    fn delete_by_id(&self, id: &DocumentId) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.delete_inner(id);
        log_call("delete", started_at, &result, |_| 1);
        result
    }
}

fn resolve_server_timestamps(fields: &DocumentFields, now: StoreTimestamp) -> DocumentFields {
    fields
        .iter()
        .map(|(name, value)| {
            let value = match value {
                FieldValue::ServerTimestamp => FieldValue::Timestamp(now),
                other => other.clone(),
            };
            (name.clone(), value)
        })
        .collect()
}

fn log_call<T>(
    op: &'static str,
    started_at: Instant,
    result: &StoreResult<T>,
    count: impl Fn(&T) -> usize,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(value) => debug!(
            "event=store_{op} module=store status=ok count={} duration_ms={duration_ms}",
            count(value)
        ),
        Err(err) => error!(
            "event=store_{op} module=store status=error duration_ms={duration_ms} error={err}"
        ),
    }
}
