//! App core for lasttab.
//!
//! Wires the history tracker and the resolver to one browser platform and
//! one store, and turns events, commands and popup actions into calls on
//! them. Errors stop at this layer: they are logged and the host keeps
//! serving.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::browser::BrowserPlatform;
use crate::managers::history_tracker::HistoryTracker;
use crate::managers::resolver::TabResolver;
use crate::storage::KeyValueStore;
use crate::types::action::{
    ActionRequest, ActionResponse, Command, DuplicateOutcome, SwitchOutcome, TabInfo,
};
use crate::types::settings::HostSettings;
use crate::types::tab::{TabId, WindowFocus, WindowId};

/// Browser notification delivered to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserEvent {
    TabActivated { tab_id: TabId, window_id: WindowId },
    WindowFocusChanged(WindowFocus),
    TabRemoved(TabId),
    /// The browser started with the extension already installed.
    Startup,
    /// The extension was installed or updated.
    Installed,
}

/// Central application struct owning the tracker and the resolver.
pub struct App<B, S> {
    tracker: Arc<HistoryTracker<B, S>>,
    resolver: TabResolver<B, S>,
    settings: HostSettings,
}

impl<B: BrowserPlatform, S: KeyValueStore> App<B, S> {
    pub fn new(browser: Arc<B>, store: Arc<S>, settings: HostSettings) -> Self {
        let tracker = Arc::new(HistoryTracker::new(browser.clone(), store, &settings));
        let resolver = TabResolver::new(tracker.clone(), browser);
        Self {
            tracker,
            resolver,
            settings,
        }
    }

    pub fn tracker(&self) -> &HistoryTracker<B, S> {
        &self.tracker
    }

    pub fn resolver(&self) -> &TabResolver<B, S> {
        &self.resolver
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    /// Restores persisted state. A storage failure leaves the tracker empty.
    pub async fn restore_state(&self) {
        match self.tracker.load().await {
            Ok(true) => {}
            Ok(false) => info!("starting with empty tab history"),
            Err(e) => error!("failed to restore tab history: {e}"),
        }
    }

    /// Startup pass: drop closed tabs from history, then pin the current tab.
    pub async fn startup_maintenance(&self) {
        if self.settings.cleanup_on_startup {
            if let Err(e) = self.tracker.cleanup_history().await {
                error!("history cleanup failed: {e}");
            }
        }
        if let Err(e) = self.tracker.seed_current_tab().await {
            error!("failed to initialize current tab: {e}");
        }
    }

    pub async fn handle_event(&self, event: BrowserEvent) {
        let result = match event {
            BrowserEvent::TabActivated { tab_id, window_id } => {
                self.tracker.on_tab_activated(tab_id, window_id).await
            }
            BrowserEvent::WindowFocusChanged(focus) => {
                self.tracker.on_window_focus_changed(focus).await
            }
            BrowserEvent::TabRemoved(tab_id) => self.tracker.on_tab_removed(tab_id).await,
            BrowserEvent::Startup | BrowserEvent::Installed => {
                debug!("lifecycle event {event:?}");
                self.tracker.seed_current_tab().await
            }
        };
        if let Err(e) = result {
            error!("error handling {event:?}: {e}");
        }
    }

    /// Runs a keyboard command by name. Unknown names are logged and ignored.
    pub async fn handle_command(&self, name: &str) {
        let Some(command) = Command::parse(name) else {
            warn!("unknown command: {name}");
            return;
        };
        debug!("command received: {}", command.name());
        match command {
            Command::SwitchToLastTab => self.switch_to_last_tab().await,
            Command::DuplicateTab => self.duplicate_tab().await,
        }
    }

    pub async fn switch_to_last_tab(&self) {
        match self.resolver.switch_to_last_used_tab().await {
            Ok(SwitchOutcome::Switched { .. }) => {}
            Ok(SwitchOutcome::NothingToSwitch) => debug!("nothing to switch to"),
            Err(e) => error!("error switching to last tab: {e}"),
        }
    }

    pub async fn duplicate_tab(&self) {
        match self.resolver.duplicate_current_tab().await {
            Ok(DuplicateOutcome::Duplicated { .. }) => {}
            Ok(DuplicateOutcome::NoActiveTab) => debug!("nothing to duplicate"),
            Err(e) => error!("error duplicating tab: {e}"),
        }
    }

    /// Current tracker state for the popup.
    pub fn tab_info(&self) -> TabInfo {
        self.tracker.tab_info()
    }

    /// Serves a popup request to completion.
    pub async fn perform_action(&self, action: ActionRequest) -> ActionResponse {
        match action {
            ActionRequest::SwitchToLastTab => {
                self.switch_to_last_tab().await;
                ActionResponse::ack()
            }
            ActionRequest::DuplicateTab => {
                self.duplicate_tab().await;
                ActionResponse::ack()
            }
            ActionRequest::GetTabInfo => ActionResponse::TabInfo(self.tab_info()),
        }
    }
}
