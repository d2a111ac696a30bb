//! Persistent key-value storage for the tracker snapshot.
//!
//! The tracker only needs the `get`/`set` surface of the browser's local
//! storage area, so the seam is a small async trait with an in-memory
//! implementation and a SQLite-backed one.

pub mod sqlite;

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::types::errors::StorageError;
use crate::types::snapshot::{
    storage_key, TrackerSnapshot, CURRENT_TAB_KEY, CURRENT_WINDOW_KEY, HISTORY_KEY,
};

pub use sqlite::SqliteStore;

/// Async key-value store holding JSON values.
pub trait KeyValueStore: Send + Sync {
    /// Returns the values present for `keys`; absent keys are omitted.
    fn get_many(
        &self,
        keys: &[String],
    ) -> impl Future<Output = Result<HashMap<String, Value>, StorageError>> + Send;

    /// Writes all entries atomically.
    fn set_many(
        &self,
        entries: Vec<(String, Value)>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Reads the snapshot stored under `namespace`.
///
/// Returns `None` when nothing has been persisted yet.
pub async fn load_snapshot<S: KeyValueStore>(
    store: &S,
    namespace: &str,
) -> Result<Option<TrackerSnapshot>, StorageError> {
    let keys: Vec<String> = [HISTORY_KEY, CURRENT_TAB_KEY, CURRENT_WINDOW_KEY]
        .iter()
        .map(|key| storage_key(namespace, key))
        .collect();
    let mut values = store.get_many(&keys).await?;
    if values.is_empty() {
        return Ok(None);
    }

    let mut field = |key: &str| {
        values
            .remove(&storage_key(namespace, key))
            .unwrap_or(Value::Null)
    };
    let history = decode(field(HISTORY_KEY), HISTORY_KEY)?;
    let current_tab_id = decode(field(CURRENT_TAB_KEY), CURRENT_TAB_KEY)?;
    let current_window_id = decode(field(CURRENT_WINDOW_KEY), CURRENT_WINDOW_KEY)?;

    Ok(Some(TrackerSnapshot {
        history,
        current_tab_id,
        current_window_id,
    }))
}

/// Writes all three snapshot keys under `namespace`.
pub async fn save_snapshot<S: KeyValueStore>(
    store: &S,
    namespace: &str,
    snapshot: &TrackerSnapshot,
) -> Result<(), StorageError> {
    let entries = vec![
        (storage_key(namespace, HISTORY_KEY), encode(&snapshot.history)?),
        (storage_key(namespace, CURRENT_TAB_KEY), encode(&snapshot.current_tab_id)?),
        (
            storage_key(namespace, CURRENT_WINDOW_KEY),
            encode(&snapshot.current_window_id)?,
        ),
    ];
    store.set_many(entries).await
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, StorageError> {
    serde_json::to_value(value).map_err(|e| StorageError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned + Default>(value: Value, key: &str) -> Result<T, StorageError> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value)
        .map_err(|e| StorageError::SerializationError(format!("{key}: {e}")))
}

/// Process-local store. Contents are lost when it is dropped.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set_many` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent write fail, simulating a storage backend fault.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw value for `key`, if stored.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.lock_values().get(key).cloned()
    }

    fn lock_values(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        match self.values.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("memory store mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl KeyValueStore for MemoryStore {
    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, Value>, StorageError> {
        let values = self.lock_values();
        Ok(keys
            .iter()
            .filter_map(|key| values.get(key).map(|v| (key.clone(), v.clone())))
            .collect())
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::DatabaseError("writes disabled".to_string()));
        }
        self.lock_values().extend(entries);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
