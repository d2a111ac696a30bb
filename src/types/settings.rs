use serde::{Deserialize, Serialize};

use super::errors::SettingsError;

/// Default bound on the recency list.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Host configuration, stored as JSON in the platform config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostSettings {
    /// Maximum number of entries kept in the recency list.
    pub history_limit: usize,
    /// Check history entries at startup and drop closed tabs.
    pub cleanup_on_startup: bool,
    /// Prefix for the persisted snapshot keys.
    pub storage_namespace: String,
    /// Explicit SQLite file; defaults to `lasttab.db` in the data directory.
    pub database_file: Option<String>,
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            cleanup_on_startup: true,
            storage_namespace: "lasttab".to_string(),
            database_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl HostSettings {
    /// Rejects values the tracker cannot work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.history_limit == 0 {
            return Err(SettingsError::InvalidValue(
                "history_limit must be at least 1".to_string(),
            ));
        }
        if self.storage_namespace.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "storage_namespace cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
