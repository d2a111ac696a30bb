//! Last-used tab resolution and the two user actions.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::history_tracker::HistoryTracker;
use crate::browser::BrowserPlatform;
use crate::storage::KeyValueStore;
use crate::types::action::{DuplicateOutcome, SwitchOutcome};
use crate::types::errors::TrackerError;
use crate::types::tab::{CreateTabRequest, TabId};

pub struct TabResolver<B, S> {
    tracker: Arc<HistoryTracker<B, S>>,
    browser: Arc<B>,
}

impl<B: BrowserPlatform, S: KeyValueStore> TabResolver<B, S> {
    pub fn new(tracker: Arc<HistoryTracker<B, S>>, browser: Arc<B>) -> Self {
        Self { tracker, browser }
    }

    /// Most recent history entry other than the current tab. No side effects.
    pub fn last_used_tab_id(&self) -> Option<TabId> {
        self.tracker.last_used_tab_id()
    }

    /// Switches to the most recently used tab that still exists.
    ///
    /// Candidates that turn out to be closed are dropped from history and the
    /// next one is tried. Every miss shrinks history by one entry, so the loop
    /// runs at most `history.len() + 1` times.
    pub async fn switch_to_last_used_tab(&self) -> Result<SwitchOutcome, TrackerError> {
        let attempts = self.tracker.history().len();

        for _ in 0..=attempts {
            let Some(candidate) = self.tracker.last_used_tab_id() else {
                info!("no last used tab available");
                return Ok(SwitchOutcome::NothingToSwitch);
            };

            let tab = match self.browser.get_tab(candidate).await {
                Ok(tab) => tab,
                Err(e) if e.is_not_found() => {
                    warn!("tab {candidate} no longer exists, removing from history");
                    self.tracker.forget(candidate).await?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            // Activating a tab does not raise its window, so focus the window first.
            self.browser.focus_window(tab.window_id).await?;
            self.browser.activate_tab(tab.id).await?;
            info!("switched to last used tab {} in window {}", tab.id, tab.window_id);
            return Ok(SwitchOutcome::Switched {
                tab_id: tab.id,
                window_id: tab.window_id,
            });
        }

        debug!("gave up after {attempts} stale history entries");
        Ok(SwitchOutcome::NothingToSwitch)
    }

    /// Opens a copy of the active tab right after it and makes it active.
    ///
    /// History is left alone; the browser's activation event for the new tab
    /// updates the tracker.
    pub async fn duplicate_current_tab(&self) -> Result<DuplicateOutcome, TrackerError> {
        let Some(source) = self.browser.query_active_tab(None).await? else {
            info!("no active tab found to duplicate");
            return Ok(DuplicateOutcome::NoActiveTab);
        };

        let created = self
            .browser
            .create_tab(CreateTabRequest::duplicate_of(&source))
            .await?;
        info!("duplicated tab {} -> {}", source.id, created.id);
        Ok(DuplicateOutcome::Duplicated {
            source: source.id,
            new_tab: created.id,
        })
    }
}
