//! In-process browser model.
//!
//! Keeps windows with ordered tab strips, one active tab per window and a
//! last-focused window, and answers [`BrowserPlatform`] calls against that
//! model. Every platform call is recorded so callers can inspect the exact
//! sequence the tracker issued.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::warn;

use super::BrowserPlatform;
use crate::types::errors::PlatformError;
use crate::types::tab::{BrowserTab, CreateTabRequest, TabId, WindowId};

/// A platform call as received by the simulated browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCall {
    QueryActiveTab(Option<WindowId>),
    GetTab(TabId),
    ActivateTab(TabId),
    FocusWindow(WindowId),
    CreateTab(CreateTabRequest),
}

struct SimWindow {
    id: WindowId,
    tab_order: Vec<TabId>,
    active_tab_id: Option<TabId>,
}

struct SimTab {
    url: String,
    window_id: WindowId,
}

struct BrowserModel {
    windows: Vec<SimWindow>,
    tabs: HashMap<TabId, SimTab>,
    focused_window: Option<WindowId>,
    next_tab_id: i64,
    next_window_id: i64,
    calls: Vec<BrowserCall>,
    failing: bool,
}

impl BrowserModel {
    fn window(&self, window_id: WindowId) -> Option<&SimWindow> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    fn window_mut(&mut self, window_id: WindowId) -> Option<&mut SimWindow> {
        self.windows.iter_mut().find(|w| w.id == window_id)
    }

    fn describe(&self, tab_id: TabId) -> Option<BrowserTab> {
        let tab = self.tabs.get(&tab_id)?;
        let window = self.window(tab.window_id)?;
        let index = window.tab_order.iter().position(|id| *id == tab_id)?;
        Some(BrowserTab {
            id: tab_id,
            window_id: window.id,
            index,
            url: tab.url.clone(),
            active: window.active_tab_id == Some(tab_id),
        })
    }

    /// Records the call and fails it if failure injection is on.
    fn begin(&mut self, call: BrowserCall) -> Result<(), PlatformError> {
        self.calls.push(call);
        if self.failing {
            return Err(PlatformError::CallFailed("simulated failure".to_string()));
        }
        Ok(())
    }

    fn insert_tab(
        &mut self,
        window_id: WindowId,
        url: &str,
        index: Option<usize>,
        active: bool,
    ) -> Result<TabId, PlatformError> {
        let id = TabId(self.next_tab_id);
        let window = self
            .window_mut(window_id)
            .ok_or(PlatformError::WindowNotFound(window_id))?;

        let position = index
            .unwrap_or(window.tab_order.len())
            .min(window.tab_order.len());
        window.tab_order.insert(position, id);
        if active || window.active_tab_id.is_none() {
            window.active_tab_id = Some(id);
        }

        self.next_tab_id += 1;
        self.tabs.insert(
            id,
            SimTab {
                url: url.to_string(),
                window_id,
            },
        );
        Ok(id)
    }
}

/// Thread-safe in-memory browser.
pub struct SimulatedBrowser {
    model: Mutex<BrowserModel>,
}

impl SimulatedBrowser {
    pub fn new() -> Self {
        Self {
            model: Mutex::new(BrowserModel {
                windows: Vec::new(),
                tabs: HashMap::new(),
                focused_window: None,
                next_tab_id: 1,
                next_window_id: 1,
                calls: Vec::new(),
                failing: false,
            }),
        }
    }

    fn lock_model(&self) -> MutexGuard<'_, BrowserModel> {
        match self.model.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("simulated browser mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Opens an empty window and focuses it.
    pub fn open_window(&self) -> WindowId {
        let mut model = self.lock_model();
        let id = WindowId(model.next_window_id);
        model.next_window_id += 1;
        model.windows.push(SimWindow {
            id,
            tab_order: Vec::new(),
            active_tab_id: None,
        });
        model.focused_window = Some(id);
        id
    }

    /// Appends a tab to `window_id`. The first tab of a window is always active.
    pub fn open_tab(
        &self,
        window_id: WindowId,
        url: &str,
        active: bool,
    ) -> Result<TabId, PlatformError> {
        self.lock_model().insert_tab(window_id, url, None, active)
    }

    /// Closes a tab. If it was active, its right neighbour (or the new last
    /// tab) becomes active; an emptied window is closed with it.
    pub fn close_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        let mut model = self.lock_model();
        let tab = model
            .tabs
            .remove(&tab_id)
            .ok_or(PlatformError::TabNotFound(tab_id))?;

        let window_id = tab.window_id;
        let window_empty = match model.window_mut(window_id) {
            Some(window) => {
                if let Some(order_idx) = window.tab_order.iter().position(|id| *id == tab_id) {
                    window.tab_order.remove(order_idx);
                    if window.active_tab_id == Some(tab_id) {
                        window.active_tab_id = if window.tab_order.is_empty() {
                            None
                        } else {
                            let next = order_idx.min(window.tab_order.len() - 1);
                            window.tab_order.get(next).copied()
                        };
                    }
                }
                window.tab_order.is_empty()
            }
            None => false,
        };

        if window_empty {
            model.windows.retain(|w| w.id != window_id);
            if model.focused_window == Some(window_id) {
                model.focused_window = model.windows.first().map(|w| w.id);
            }
        }
        Ok(())
    }

    /// Makes `tab_id` active without recording a platform call.
    pub fn select_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        let mut model = self.lock_model();
        let window_id = model
            .tabs
            .get(&tab_id)
            .map(|t| t.window_id)
            .ok_or(PlatformError::TabNotFound(tab_id))?;
        if let Some(window) = model.window_mut(window_id) {
            window.active_tab_id = Some(tab_id);
        }
        Ok(())
    }

    /// Changes the last focused window without recording a platform call.
    pub fn set_focused_window(&self, window_id: Option<WindowId>) {
        self.lock_model().focused_window = window_id;
    }

    pub fn focused_window(&self) -> Option<WindowId> {
        self.lock_model().focused_window
    }

    pub fn tab_exists(&self, tab_id: TabId) -> bool {
        self.lock_model().tabs.contains_key(&tab_id)
    }

    pub fn tab(&self, tab_id: TabId) -> Option<BrowserTab> {
        self.lock_model().describe(tab_id)
    }

    pub fn active_tab_id(&self, window_id: WindowId) -> Option<TabId> {
        self.lock_model()
            .window(window_id)
            .and_then(|w| w.active_tab_id)
    }

    pub fn tab_order(&self, window_id: WindowId) -> Vec<TabId> {
        self.lock_model()
            .window(window_id)
            .map(|w| w.tab_order.clone())
            .unwrap_or_default()
    }

    /// Platform calls received so far, oldest first.
    pub fn calls(&self) -> Vec<BrowserCall> {
        self.lock_model().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock_model().calls.clear();
    }

    /// When set, every platform call fails with [`PlatformError::CallFailed`].
    pub fn set_failing(&self, failing: bool) {
        self.lock_model().failing = failing;
    }
}

impl Default for SimulatedBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserPlatform for SimulatedBrowser {
    async fn query_active_tab(
        &self,
        window: Option<WindowId>,
    ) -> Result<Option<BrowserTab>, PlatformError> {
        let mut model = self.lock_model();
        model.begin(BrowserCall::QueryActiveTab(window))?;

        let active = match window {
            Some(window_id) => model.window(window_id).and_then(|w| w.active_tab_id),
            None => model
                .focused_window
                .and_then(|id| model.window(id))
                .and_then(|w| w.active_tab_id)
                .or_else(|| model.windows.iter().find_map(|w| w.active_tab_id)),
        };
        Ok(active.and_then(|id| model.describe(id)))
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<BrowserTab, PlatformError> {
        let mut model = self.lock_model();
        model.begin(BrowserCall::GetTab(tab_id))?;
        model
            .describe(tab_id)
            .ok_or(PlatformError::TabNotFound(tab_id))
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        let mut model = self.lock_model();
        model.begin(BrowserCall::ActivateTab(tab_id))?;
        let window_id = model
            .tabs
            .get(&tab_id)
            .map(|t| t.window_id)
            .ok_or(PlatformError::TabNotFound(tab_id))?;
        let window = model
            .window_mut(window_id)
            .ok_or(PlatformError::WindowNotFound(window_id))?;
        window.active_tab_id = Some(tab_id);
        Ok(())
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<(), PlatformError> {
        let mut model = self.lock_model();
        model.begin(BrowserCall::FocusWindow(window_id))?;
        if model.window(window_id).is_none() {
            return Err(PlatformError::WindowNotFound(window_id));
        }
        model.focused_window = Some(window_id);
        Ok(())
    }

    async fn create_tab(&self, request: CreateTabRequest) -> Result<BrowserTab, PlatformError> {
        let mut model = self.lock_model();
        model.begin(BrowserCall::CreateTab(request.clone()))?;
        let window_id = request
            .window_id
            .or(model.focused_window)
            .ok_or_else(|| PlatformError::CallFailed("no window to open the tab in".to_string()))?;
        let id = model.insert_tab(window_id, &request.url, Some(request.index), request.active)?;
        model
            .describe(id)
            .ok_or_else(|| PlatformError::CallFailed(format!("created tab {id} vanished")))
    }
}
