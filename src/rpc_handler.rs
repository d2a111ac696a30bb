//! Message dispatch for the native-messaging host.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested without stdio.
//! [`RpcHandler::handle_message`] routes one decoded inbound frame: platform
//! responses complete pending bridge calls, everything else reaches the
//! [`App`] on a spawned task so the reader loop never blocks on the browser.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::{App, BrowserEvent};
use crate::browser::bridge::BridgePlatform;
use crate::protocol::{InboundMessage, OutboundMessage};
use crate::storage::KeyValueStore;
use crate::types::action::{ActionRequest, ActionResponse};
use crate::types::tab::WindowFocus;

/// How long shutdown waits for in-flight handlers to finish.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct RpcHandler<S> {
    app: Arc<App<BridgePlatform, S>>,
    bridge: Arc<BridgePlatform>,
    outgoing: mpsc::UnboundedSender<OutboundMessage>,
}

impl<S: KeyValueStore + 'static> RpcHandler<S> {
    pub fn new(
        app: Arc<App<BridgePlatform, S>>,
        bridge: Arc<BridgePlatform>,
        outgoing: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Self {
        Self {
            app,
            bridge,
            outgoing,
        }
    }

    /// Handles one inbound message.
    ///
    /// Returns the spawned task when the message started background work.
    /// Tasks are spawned in arrival order.
    pub fn handle_message(&self, message: InboundMessage) -> Option<JoinHandle<()>> {
        let event = match message {
            InboundMessage::PlatformResponse {
                call_id,
                result,
                error,
            } => {
                let outcome = match error {
                    Some(remote) => Err(remote),
                    None => Ok(result.unwrap_or(serde_json::Value::Null)),
                };
                if !self.bridge.complete(call_id, outcome) {
                    warn!("response for unknown platform call {call_id}");
                }
                return None;
            }
            InboundMessage::Action { request_id, action } => {
                return self.handle_action(request_id, action);
            }
            InboundMessage::Command { name } => {
                let app = self.app.clone();
                return Some(tokio::spawn(async move {
                    app.handle_command(&name).await;
                }));
            }
            InboundMessage::TabActivated { tab_id, window_id } => {
                BrowserEvent::TabActivated { tab_id, window_id }
            }
            InboundMessage::WindowFocusChanged { window_id } => {
                BrowserEvent::WindowFocusChanged(WindowFocus::from_raw(window_id))
            }
            InboundMessage::TabRemoved { tab_id } => BrowserEvent::TabRemoved(tab_id),
            InboundMessage::Startup => BrowserEvent::Startup,
            InboundMessage::Installed => BrowserEvent::Installed,
        };

        let app = self.app.clone();
        Some(tokio::spawn(async move {
            app.handle_event(event).await;
        }))
    }

    /// Fails outstanding platform calls and waits for `tasks` to finish, so
    /// handlers get to persist before the process exits.
    pub async fn shutdown(&self, tasks: Vec<JoinHandle<()>>) {
        self.bridge.disconnect();
        let pending = tasks.len();
        let drain = async {
            for task in tasks {
                if let Err(e) = task.await {
                    warn!("handler task failed during shutdown: {e}");
                }
            }
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            warn!("{pending} handlers still running after {SHUTDOWN_GRACE:?}, exiting anyway");
        }
    }

    /// Popup requests. Info is answered inline; the two actions are
    /// acknowledged right away and then carried out.
    fn handle_action(&self, request_id: u64, action: ActionRequest) -> Option<JoinHandle<()>> {
        debug!("action request {request_id}: {action:?}");
        match action {
            ActionRequest::GetTabInfo => {
                self.respond(request_id, ActionResponse::TabInfo(self.app.tab_info()));
                None
            }
            ActionRequest::SwitchToLastTab | ActionRequest::DuplicateTab => {
                self.respond(request_id, ActionResponse::ack());
                let app = self.app.clone();
                Some(tokio::spawn(async move {
                    app.perform_action(action).await;
                }))
            }
        }
    }

    fn respond(&self, request_id: u64, response: ActionResponse) {
        if self
            .outgoing
            .send(OutboundMessage::ActionResponse {
                request_id,
                response,
            })
            .is_err()
        {
            warn!("writer closed, dropping response to request {request_id}");
        }
    }
}
