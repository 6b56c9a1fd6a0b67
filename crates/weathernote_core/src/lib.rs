//! Core logic for the weather notification admin screen.
//! Owns the record model, the collection gateway and the sync controller.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::codec::{decode, encode};
pub use model::document::{Document, DocumentFields, DocumentId, FieldValue, StoreTimestamp};
pub use model::notification::{
    FormError, Notification, NotificationForm, NotificationId, NotificationKind,
};
pub use service::sync_controller::{
    CreateNotificationRequest, CreateOutcome, LoadingFlag, SyncController, SyncError, SyncResult,
};
pub use store::sqlite_collection::{SqliteCollection, DEFAULT_COLLECTION};
pub use store::{DocumentCollection, SortOrder, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Opens the configured collection with migrations applied.
pub fn open_collection(config: &StoreConfig) -> StoreResult<SqliteCollection> {
    let conn = db::open_db(&config.db_path)?;
    Ok(SqliteCollection::new(conn, config.collection.clone()))
}
