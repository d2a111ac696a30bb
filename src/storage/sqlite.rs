//! SQLite-backed key-value store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use tracing::warn;

use super::KeyValueStore;
use crate::database::migrations::unix_now;
use crate::database::Database;
use crate::types::errors::StorageError;

/// Key-value store persisted in the `kv_store` table.
///
/// Values are stored as JSON text. Writes from one `set_many` call share a
/// transaction so a snapshot is never half-written.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn lock_db(&self) -> MutexGuard<'_, Database> {
        match self.db.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("database mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl KeyValueStore for SqliteStore {
    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, Value>, StorageError> {
        let db = self.lock_db();
        let conn = db.connection();
        let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;

        let mut values = HashMap::new();
        for key in keys {
            let raw: Option<String> = stmt
                .query_row(params![key], |row| row.get(0))
                .optional()?;
            if let Some(raw) = raw {
                let value = serde_json::from_str(&raw)
                    .map_err(|e| StorageError::SerializationError(format!("{key}: {e}")))?;
                values.insert(key.clone(), value);
            }
        }
        Ok(values)
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StorageError> {
        let db = self.lock_db();
        let tx = db.connection().unchecked_transaction()?;
        let now = unix_now();
        for (key, value) in &entries {
            let raw = serde_json::to_string(value)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            tx.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, raw, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
