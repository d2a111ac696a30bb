use serde::{Deserialize, Serialize};

use super::tab::{TabId, WindowId};

/// One-shot request sent by the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionRequest {
    SwitchToLastTab,
    DuplicateTab,
    GetTabInfo,
}

/// Reply to an [`ActionRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionResponse {
    TabInfo(TabInfo),
    Ack { success: bool },
}

impl ActionResponse {
    pub fn ack() -> Self {
        ActionResponse::Ack { success: true }
    }
}

/// Tracker state as shown by the popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub current_tab_id: Option<TabId>,
    pub last_used_tab_id: Option<TabId>,
    pub tab_history: Vec<TabId>,
}

impl TabInfo {
    /// Whether the popup should offer the switch action.
    pub fn can_switch(&self) -> bool {
        self.last_used_tab_id.is_some()
    }

    /// Neutral status line for the popup.
    pub fn status_message(&self) -> String {
        match self.last_used_tab_id {
            Some(tab_id) => format!("Ready to switch to tab {tab_id}"),
            None if !self.tab_history.is_empty() => {
                "No available tabs in history (all may be closed)".to_string()
            }
            None => "No last used tab available. Switch between tabs first.".to_string(),
        }
    }
}

/// Keyboard shortcut commands registered by the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SwitchToLastTab,
    DuplicateTab,
}

impl Command {
    /// Parses a command name as delivered by the browser.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "switch-to-last-tab" => Some(Command::SwitchToLastTab),
            "duplicate-tab" => Some(Command::DuplicateTab),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::SwitchToLastTab => "switch-to-last-tab",
            Command::DuplicateTab => "duplicate-tab",
        }
    }
}

/// Result of a switch-to-last-tab attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched { tab_id: TabId, window_id: WindowId },
    /// History holds no live tab other than the current one.
    NothingToSwitch,
}

/// Result of a duplicate-current-tab attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateOutcome {
    Duplicated { source: TabId, new_tab: TabId },
    NoActiveTab,
}
