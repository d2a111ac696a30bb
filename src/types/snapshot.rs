use serde::{Deserialize, Serialize};

use super::tab::{TabId, WindowId};

/// Storage key holding the ordered recency list.
pub const HISTORY_KEY: &str = "tabHistory";
/// Storage key holding the current tab id (null when unknown).
pub const CURRENT_TAB_KEY: &str = "currentTabId";
/// Storage key holding the current window id (null when unknown).
pub const CURRENT_WINDOW_KEY: &str = "currentWindowId";

/// Builds the namespaced storage key for one of the snapshot fields.
pub fn storage_key(namespace: &str, key: &str) -> String {
    format!("{namespace}.{key}")
}

/// Persisted form of the tracker state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    /// Most-recently-superseded first.
    pub history: Vec<TabId>,
    pub current_tab_id: Option<TabId>,
    pub current_window_id: Option<WindowId>,
}
