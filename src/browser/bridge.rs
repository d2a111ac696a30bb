//! [`BrowserPlatform`] over the native-messaging channel.
//!
//! Each call is sent as a `platform_call` frame tagged with a fresh call id
//! and parked until the extension answers with a matching
//! `platform_response`. The reader loop hands responses back through
//! [`BridgePlatform::complete`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::BrowserPlatform;
use crate::protocol::{OutboundMessage, PlatformCall, RemoteError};
use crate::types::errors::PlatformError;
use crate::types::tab::{BrowserTab, CreateTabRequest, TabId, WindowId};

type PendingReply = oneshot::Sender<Result<Value, RemoteError>>;

pub struct BridgePlatform {
    outgoing: mpsc::UnboundedSender<OutboundMessage>,
    pending: Mutex<HashMap<u64, PendingReply>>,
    next_call_id: AtomicU64,
    closed: AtomicBool,
}

impl BridgePlatform {
    pub fn new(outgoing: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self {
            outgoing,
            pending: Mutex::new(HashMap::new()),
            next_call_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<u64, PendingReply>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("bridge pending-call mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Delivers the extension's answer to call `call_id`.
    ///
    /// Returns `false` if no call with that id is waiting.
    pub fn complete(&self, call_id: u64, outcome: Result<Value, RemoteError>) -> bool {
        let Some(reply) = self.lock_pending().remove(&call_id) else {
            return false;
        };
        // The caller may have gone away; nothing to do then.
        let _ = reply.send(outcome);
        true
    }

    /// Fails every waiting call, and every later one, with
    /// [`PlatformError::Disconnected`].
    pub fn disconnect(&self) {
        let dropped = {
            let mut pending = self.lock_pending();
            self.closed.store(true, Ordering::SeqCst);
            let count = pending.len();
            pending.clear();
            count
        };
        if dropped > 0 {
            debug!("dropped {dropped} pending platform calls on disconnect");
        }
    }

    /// Number of calls waiting for an answer.
    pub fn pending_calls(&self) -> usize {
        self.lock_pending().len()
    }

    async fn call(&self, call: PlatformCall, not_found: PlatformError) -> Result<Value, PlatformError> {
        let call_id = self.next_call_id.fetch_add(1, Ordering::SeqCst);
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let mut pending = self.lock_pending();
            if self.closed.load(Ordering::SeqCst) {
                return Err(PlatformError::Disconnected);
            }
            pending.insert(call_id, reply_tx);
        }

        let op = call.op();
        debug!("platform call {call_id}: {op}");
        if self
            .outgoing
            .send(OutboundMessage::PlatformCall { call_id, call })
            .is_err()
        {
            self.lock_pending().remove(&call_id);
            return Err(PlatformError::Disconnected);
        }

        match reply_rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(RemoteError::NotFound)) => Err(not_found),
            Ok(Err(RemoteError::Failed { message })) => {
                Err(PlatformError::CallFailed(format!("{op}: {message}")))
            }
            Err(_) => Err(PlatformError::Disconnected),
        }
    }
}

fn parse_result<T: DeserializeOwned>(value: Value, op: &str) -> Result<T, PlatformError> {
    serde_json::from_value(value)
        .map_err(|e| PlatformError::CallFailed(format!("malformed {op} result: {e}")))
}

impl BrowserPlatform for BridgePlatform {
    async fn query_active_tab(
        &self,
        window: Option<WindowId>,
    ) -> Result<Option<BrowserTab>, PlatformError> {
        let not_found = match window {
            Some(window_id) => PlatformError::WindowNotFound(window_id),
            None => PlatformError::CallFailed("queryActiveTab: no window".to_string()),
        };
        let value = self
            .call(PlatformCall::QueryActiveTab { window_id: window }, not_found)
            .await?;
        parse_result(value, "queryActiveTab")
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<BrowserTab, PlatformError> {
        let value = self
            .call(PlatformCall::GetTab { tab_id }, PlatformError::TabNotFound(tab_id))
            .await?;
        parse_result(value, "getTab")
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        self.call(
            PlatformCall::UpdateTab {
                tab_id,
                active: true,
            },
            PlatformError::TabNotFound(tab_id),
        )
        .await?;
        Ok(())
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<(), PlatformError> {
        self.call(
            PlatformCall::UpdateWindow {
                window_id,
                focused: true,
            },
            PlatformError::WindowNotFound(window_id),
        )
        .await?;
        Ok(())
    }

    async fn create_tab(&self, request: CreateTabRequest) -> Result<BrowserTab, PlatformError> {
        let not_found = match request.window_id {
            Some(window_id) => PlatformError::WindowNotFound(window_id),
            None => PlatformError::CallFailed("createTab: no window".to_string()),
        };
        let value = self.call(PlatformCall::CreateTab(request), not_found).await?;
        parse_result(value, "createTab")
    }
}
