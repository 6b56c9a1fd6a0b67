//! Store configuration resolved from the process environment.
//!
//! # Invariants
//! - Blank environment values behave as if unset.
//! - Resolution never fails; unset values fall back to defaults.

use crate::store::sqlite_collection::DEFAULT_COLLECTION;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "WEATHERNOTE_DB_PATH";
pub const COLLECTION_ENV: &str = "WEATHERNOTE_COLLECTION";
const DEFAULT_DB_FILE_NAME: &str = "weathernote.sqlite3";

/// Where the notification collection lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl StoreConfig {
    /// Resolves configuration from `WEATHERNOTE_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: non_blank(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            collection: non_blank(COLLECTION_ENV).unwrap_or(defaults.collection),
        }
    }
}
