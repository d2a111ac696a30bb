use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw window id the browser reports when focus leaves all of its windows.
pub const WINDOW_ID_NONE: i64 = -1;

/// Browser-assigned tab identifier.
///
/// Unique among open tabs at any instant, but the browser may hand the same
/// value to a new tab once the old one is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

/// Browser-assigned window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target of a window focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFocus {
    /// No browser window has focus (another application is in front).
    None,
    Window(WindowId),
}

impl WindowFocus {
    /// Interprets a raw window id, mapping the browser's sentinel to `None`.
    pub fn from_raw(raw: i64) -> Self {
        if raw == WINDOW_ID_NONE {
            WindowFocus::None
        } else {
            WindowFocus::Window(WindowId(raw))
        }
    }
}

/// A tab as reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserTab {
    pub id: TabId,
    pub window_id: WindowId,
    /// Zero-based position within the owning window's tab strip.
    pub index: usize,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub active: bool,
}

/// Parameters for opening a new tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTabRequest {
    pub url: String,
    pub index: usize,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
}

impl CreateTabRequest {
    /// Request for a copy of `source` placed right after it and made active.
    pub fn duplicate_of(source: &BrowserTab) -> Self {
        Self {
            url: source.url.clone(),
            index: source.index + 1,
            active: true,
            window_id: Some(source.window_id),
        }
    }
}
