//! Tab recency tracker.
//!
//! Owns the recency list and the current tab/window pointers, folds browser
//! events into them and persists a snapshot after every mutation.
//!
//! Handlers may interleave at every platform or storage call. State lives
//! behind a plain mutex that is never held across an `.await`; every step
//! that follows a suspension re-reads the state instead of trusting values
//! captured before it.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::tab_history::TabHistory;
use crate::browser::BrowserPlatform;
use crate::storage::{load_snapshot, save_snapshot, KeyValueStore};
use crate::types::action::TabInfo;
use crate::types::errors::TrackerError;
use crate::types::settings::HostSettings;
use crate::types::snapshot::TrackerSnapshot;
use crate::types::tab::{TabId, WindowFocus, WindowId};

struct TrackerState {
    history: TabHistory,
    current_tab_id: Option<TabId>,
    current_window_id: Option<WindowId>,
    /// Bumped on every activation; lets a handler tell whether one landed
    /// while it was waiting on the browser.
    activations: u64,
}

impl TrackerState {
    fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            history: self.history.entries().to_vec(),
            current_tab_id: self.current_tab_id,
            current_window_id: self.current_window_id,
        }
    }

    /// Makes `tab_id` current, pushing the previous current tab to history.
    fn activate(&mut self, tab_id: TabId, window_id: WindowId) {
        if let Some(previous) = self.current_tab_id {
            if previous != tab_id {
                self.history.push_front(previous);
            }
        }
        self.current_tab_id = Some(tab_id);
        self.current_window_id = Some(window_id);
        self.activations += 1;
    }

    fn clear_current(&mut self) {
        self.current_tab_id = None;
        self.current_window_id = None;
    }
}

pub struct HistoryTracker<B, S> {
    browser: Arc<B>,
    store: Arc<S>,
    namespace: String,
    state: Mutex<TrackerState>,
    /// Serialises snapshot writes so the last write always carries the newest state.
    persist_lock: AsyncMutex<()>,
}

impl<B: BrowserPlatform, S: KeyValueStore> HistoryTracker<B, S> {
    /// Creates an empty tracker. Call [`load`](Self::load) to restore persisted state.
    pub fn new(browser: Arc<B>, store: Arc<S>, settings: &HostSettings) -> Self {
        Self {
            browser,
            store,
            namespace: settings.storage_namespace.clone(),
            state: Mutex::new(TrackerState {
                history: TabHistory::new(settings.history_limit),
                current_tab_id: None,
                current_window_id: None,
                activations: 0,
            }),
            persist_lock: AsyncMutex::new(()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("tracker state mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        self.lock_state().snapshot()
    }

    pub fn history(&self) -> Vec<TabId> {
        self.lock_state().history.entries().to_vec()
    }

    pub fn current_tab_id(&self) -> Option<TabId> {
        self.lock_state().current_tab_id
    }

    pub fn current_window_id(&self) -> Option<WindowId> {
        self.lock_state().current_window_id
    }

    /// Most recent history entry that is not the current tab.
    pub fn last_used_tab_id(&self) -> Option<TabId> {
        let state = self.lock_state();
        state.history.last_used(state.current_tab_id)
    }

    /// Current state as shown by the popup, read under one lock.
    pub fn tab_info(&self) -> TabInfo {
        let state = self.lock_state();
        TabInfo {
            current_tab_id: state.current_tab_id,
            last_used_tab_id: state.history.last_used(state.current_tab_id),
            tab_history: state.history.entries().to_vec(),
        }
    }

    /// Replaces in-memory state with the persisted snapshot, if any.
    ///
    /// Stored history is deduplicated and cut to the configured limit.
    /// Returns whether a snapshot was found.
    pub async fn load(&self) -> Result<bool, TrackerError> {
        let Some(snapshot) = load_snapshot(self.store.as_ref(), &self.namespace).await? else {
            debug!("no persisted tracker state under '{}'", self.namespace);
            return Ok(false);
        };

        let mut state = self.lock_state();
        let limit = state.history.limit();
        state.history = TabHistory::from_entries(snapshot.history, limit);
        state.current_tab_id = snapshot.current_tab_id;
        state.current_window_id = snapshot.current_window_id;
        info!(
            "restored tracker state: current={:?}, history={:?}",
            state.current_tab_id,
            state.history.entries()
        );
        Ok(true)
    }

    /// Writes the current state to storage.
    pub async fn persist(&self) -> Result<(), TrackerError> {
        let _write = self.persist_lock.lock().await;
        let snapshot = self.snapshot();
        save_snapshot(self.store.as_ref(), &self.namespace, &snapshot).await?;
        Ok(())
    }

    /// A tab became active in `window_id`.
    pub async fn on_tab_activated(
        &self,
        tab_id: TabId,
        window_id: WindowId,
    ) -> Result<(), TrackerError> {
        {
            let mut state = self.lock_state();
            state.activate(tab_id, window_id);
            debug!(
                "tab switched: current={tab_id}, last={:?}",
                state.history.last_used(state.current_tab_id)
            );
        }
        self.persist().await
    }

    /// Focus moved to another window (or away from the browser).
    ///
    /// Switching windows does not fire a tab activation when the destination
    /// window keeps its active tab, so the active tab is looked up here.
    pub async fn on_window_focus_changed(&self, focus: WindowFocus) -> Result<(), TrackerError> {
        let window_id = match focus {
            WindowFocus::None => {
                debug!("focus left the browser");
                return Ok(());
            }
            WindowFocus::Window(window_id) => window_id,
        };

        let seen = self.lock_state().activations;
        let active = match self.browser.query_active_tab(Some(window_id)).await {
            Ok(active) => active,
            Err(e) if e.is_not_found() => {
                debug!("focused window {window_id} is already gone");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let Some(tab) = active else {
            debug!("focused window {window_id} has no active tab");
            return Ok(());
        };

        {
            let mut state = self.lock_state();
            if state.activations != seen {
                debug!("activation arrived while querying window {window_id}, keeping it");
                return Ok(());
            }
            state.activate(tab.id, window_id);
            debug!("window focus changed: window={window_id}, current={}", tab.id);
        }
        self.persist().await
    }

    /// A tab was closed.
    ///
    /// The closed tab leaves history. If it was current, the pointers are
    /// cleared right away so a concurrent activation cannot push it back,
    /// and the browser's new active tab is adopted unless an activation
    /// got there first.
    pub async fn on_tab_removed(&self, tab_id: TabId) -> Result<(), TrackerError> {
        let seen = {
            let mut state = self.lock_state();
            if state.history.remove(tab_id) {
                debug!("removed closed tab {tab_id} from history");
            }
            if state.current_tab_id == Some(tab_id) {
                state.clear_current();
                Some(state.activations)
            } else {
                None
            }
        };

        if let Some(seen) = seen {
            let replacement = match self.browser.query_active_tab(None).await {
                Ok(replacement) => replacement,
                Err(e) => {
                    self.persist().await?;
                    return Err(e.into());
                }
            };

            let mut state = self.lock_state();
            if state.activations != seen || state.current_tab_id.is_some() {
                debug!("activation arrived after closing {tab_id}, keeping it");
            } else {
                match replacement.filter(|tab| tab.id != tab_id) {
                    Some(tab) => {
                        debug!("new current tab after closure: {}", tab.id);
                        state.current_tab_id = Some(tab.id);
                        state.current_window_id = Some(tab.window_id);
                    }
                    None => debug!("no active tab left after closing {tab_id}"),
                }
            }
        }

        self.persist().await
    }

    /// Drops history entries whose tabs no longer exist.
    ///
    /// Meant for startup only; each entry costs one platform call. Persists
    /// only when something was removed. Returns the number of entries dropped.
    pub async fn cleanup_history(&self) -> Result<usize, TrackerError> {
        let mut removed = 0;
        let mut failure = None;

        for tab_id in self.history() {
            match self.browser.get_tab(tab_id).await {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    if self.lock_state().history.remove(tab_id) {
                        removed += 1;
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if removed > 0 {
            info!("history cleanup dropped {removed} closed tabs");
            self.persist().await?;
        }
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(removed),
        }
    }

    /// Removes one stale entry from history and persists.
    ///
    /// Returns whether the entry was still present.
    pub async fn forget(&self, tab_id: TabId) -> Result<bool, TrackerError> {
        let removed = self.lock_state().history.remove(tab_id);
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    /// Makes sure the current tab pointer refers to a live tab.
    ///
    /// Keeps a restored current tab that still exists; otherwise adopts the
    /// browser's active tab without touching history.
    pub async fn seed_current_tab(&self) -> Result<(), TrackerError> {
        let (known, seen) = {
            let state = self.lock_state();
            (state.current_tab_id, state.activations)
        };
        if let Some(tab_id) = known {
            match self.browser.get_tab(tab_id).await {
                Ok(_) => {
                    debug!("current tab {tab_id} is still open");
                    return Ok(());
                }
                Err(e) if e.is_not_found() => {
                    debug!("restored current tab {tab_id} is gone");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let active = self.browser.query_active_tab(None).await?;
        {
            let mut state = self.lock_state();
            if state.current_tab_id != known || state.activations != seen {
                debug!("current tab changed while seeding, keeping it");
                return Ok(());
            }
            match active {
                Some(tab) => {
                    info!("initialized with current tab {}", tab.id);
                    state.current_tab_id = Some(tab.id);
                    state.current_window_id = Some(tab.window_id);
                }
                None => state.clear_current(),
            }
        }
        self.persist().await
    }
}
