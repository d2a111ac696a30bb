//! Browser platform seam.
//!
//! Everything the tracker and resolver ask of the browser goes through
//! [`BrowserPlatform`]. The host binary talks to the real browser through
//! [`bridge::BridgePlatform`]. With the `test-support` feature,
//! `simulated::SimulatedBrowser` is an in-process model used to drive the
//! tracker without a browser.

pub mod bridge;
#[cfg(any(test, feature = "test-support"))]
pub mod simulated;

use std::future::Future;

use crate::types::errors::PlatformError;
use crate::types::tab::{BrowserTab, CreateTabRequest, TabId, WindowId};

/// Tab and window operations offered by the browser.
pub trait BrowserPlatform: Send + Sync {
    /// Active tab of `window`, or of the last focused window when `None`.
    fn query_active_tab(
        &self,
        window: Option<WindowId>,
    ) -> impl Future<Output = Result<Option<BrowserTab>, PlatformError>> + Send;

    /// Looks a tab up by id. Fails with [`PlatformError::TabNotFound`] if it is gone.
    fn get_tab(
        &self,
        tab_id: TabId,
    ) -> impl Future<Output = Result<BrowserTab, PlatformError>> + Send;

    /// Makes `tab_id` the active tab of its window.
    fn activate_tab(&self, tab_id: TabId) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Brings `window_id` to the front.
    fn focus_window(
        &self,
        window_id: WindowId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Opens a new tab and returns it.
    fn create_tab(
        &self,
        request: CreateTabRequest,
    ) -> impl Future<Output = Result<BrowserTab, PlatformError>> + Send;
}
