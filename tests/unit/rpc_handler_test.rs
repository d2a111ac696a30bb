//! Unit tests for host message dispatch and bridge call correlation.

use std::sync::Arc;

use lasttab::app::App;
use lasttab::browser::bridge::BridgePlatform;
use lasttab::browser::BrowserPlatform;
use lasttab::protocol::{InboundMessage, OutboundMessage, PlatformCall, RemoteError};
use lasttab::rpc_handler::RpcHandler;
use lasttab::storage::MemoryStore;
use lasttab::types::action::{ActionRequest, ActionResponse, TabInfo};
use lasttab::types::errors::PlatformError;
use lasttab::types::settings::HostSettings;
use lasttab::types::tab::{TabId, WindowId};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Host {
    app: Arc<App<BridgePlatform, MemoryStore>>,
    bridge: Arc<BridgePlatform>,
    store: Arc<MemoryStore>,
    handler: RpcHandler<MemoryStore>,
    rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

fn host() -> Host {
    let (tx, rx) = mpsc::unbounded_channel();
    let bridge = Arc::new(BridgePlatform::new(tx.clone()));
    let store = Arc::new(MemoryStore::new());
    let app = Arc::new(App::new(bridge.clone(), store.clone(), HostSettings::default()));
    let handler = RpcHandler::new(app.clone(), bridge.clone(), tx);
    Host {
        app,
        bridge,
        store,
        handler,
        rx,
    }
}

impl Host {
    async fn next_call(&mut self) -> (u64, PlatformCall) {
        match self.rx.recv().await {
            Some(OutboundMessage::PlatformCall { call_id, call }) => (call_id, call),
            other => panic!("expected a platform call, got {other:?}"),
        }
    }

    fn answer(&self, call_id: u64, result: Value) {
        self.handler.handle_message(InboundMessage::PlatformResponse {
            call_id,
            result: Some(result),
            error: None,
        });
    }

    fn fail(&self, call_id: u64, error: RemoteError) {
        self.handler.handle_message(InboundMessage::PlatformResponse {
            call_id,
            result: None,
            error: Some(error),
        });
    }

    fn send(&self, message: InboundMessage) -> JoinHandle<()> {
        self.handler.handle_message(message).unwrap()
    }

    async fn activate(&self, tab: i64, window: i64) {
        let task = self
            .handler
            .handle_message(InboundMessage::TabActivated {
                tab_id: TabId(tab),
                window_id: WindowId(window),
            })
            .unwrap();
        task.await.unwrap();
    }
}

#[tokio::test]
async fn test_events_reach_the_tracker() {
    let host = host();
    host.activate(1, 1).await;
    host.activate(2, 1).await;

    assert_eq!(host.app.tracker().history(), vec![TabId(1)]);
    assert_eq!(host.app.tracker().current_tab_id(), Some(TabId(2)));
}

#[tokio::test]
async fn test_get_tab_info_is_answered_inline() {
    let mut host = host();
    host.activate(1, 1).await;
    host.activate(2, 1).await;

    let task = host.handler.handle_message(InboundMessage::Action {
        request_id: 11,
        action: ActionRequest::GetTabInfo,
    });
    assert!(task.is_none());

    match host.rx.try_recv() {
        Ok(OutboundMessage::ActionResponse {
            request_id,
            response,
        }) => {
            assert_eq!(request_id, 11);
            assert_eq!(
                response,
                ActionResponse::TabInfo(TabInfo {
                    current_tab_id: Some(TabId(2)),
                    last_used_tab_id: Some(TabId(1)),
                    tab_history: vec![TabId(1)],
                })
            );
        }
        other => panic!("expected an action response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_switch_action_acks_then_drives_platform() {
    let mut host = host();
    host.activate(1, 1).await;
    host.activate(2, 1).await;

    let task = host
        .handler
        .handle_message(InboundMessage::Action {
            request_id: 3,
            action: ActionRequest::SwitchToLastTab,
        })
        .unwrap();

    assert_eq!(
        host.rx.recv().await,
        Some(OutboundMessage::ActionResponse {
            request_id: 3,
            response: ActionResponse::ack(),
        })
    );

    let (id, call) = host.next_call().await;
    assert_eq!(call, PlatformCall::GetTab { tab_id: TabId(1) });
    host.answer(id, json!({"id": 1, "windowId": 1, "index": 0}));

    let (id, call) = host.next_call().await;
    assert_eq!(
        call,
        PlatformCall::UpdateWindow {
            window_id: WindowId(1),
            focused: true
        }
    );
    host.answer(id, Value::Null);

    let (id, call) = host.next_call().await;
    assert_eq!(
        call,
        PlatformCall::UpdateTab {
            tab_id: TabId(1),
            active: true
        }
    );
    host.answer(id, Value::Null);

    task.await.unwrap();
    assert_eq!(host.bridge.pending_calls(), 0);
}

#[tokio::test]
async fn test_not_found_answer_drops_stale_entry() {
    let mut host = host();
    host.activate(1, 1).await;
    host.activate(2, 1).await;
    host.activate(3, 1).await;

    let task = host
        .handler
        .handle_message(InboundMessage::Command {
            name: "switch-to-last-tab".to_string(),
        })
        .unwrap();

    let (id, call) = host.next_call().await;
    assert_eq!(call, PlatformCall::GetTab { tab_id: TabId(2) });
    host.fail(id, RemoteError::NotFound);

    let (id, call) = host.next_call().await;
    assert_eq!(call, PlatformCall::GetTab { tab_id: TabId(1) });
    host.fail(id, RemoteError::Failed {
        message: "tabs API unavailable".to_string(),
    });

    task.await.unwrap();
    assert_eq!(host.app.tracker().history(), vec![TabId(1)]);
}

#[tokio::test]
async fn test_bridge_maps_remote_errors() {
    let mut host = host();
    let bridge = host.bridge.clone();
    let lookup = tokio::spawn(async move { bridge.get_tab(TabId(5)).await });

    let (id, _call) = host.next_call().await;
    host.fail(id, RemoteError::NotFound);
    assert!(matches!(
        lookup.await.unwrap(),
        Err(PlatformError::TabNotFound(TabId(5)))
    ));

    let bridge = host.bridge.clone();
    let focus = tokio::spawn(async move { bridge.focus_window(WindowId(2)).await });
    let (id, _call) = host.next_call().await;
    host.fail(id, RemoteError::Failed {
        message: "denied".to_string(),
    });
    match focus.await.unwrap() {
        Err(PlatformError::CallFailed(message)) => assert_eq!(message, "updateWindow: denied"),
        other => panic!("expected CallFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bridge_rejects_malformed_result() {
    let mut host = host();
    let bridge = host.bridge.clone();
    let lookup = tokio::spawn(async move { bridge.get_tab(TabId(5)).await });

    let (id, _call) = host.next_call().await;
    host.answer(id, json!({"unexpected": true}));
    assert!(matches!(
        lookup.await.unwrap(),
        Err(PlatformError::CallFailed(_))
    ));
}

#[tokio::test]
async fn test_answers_are_matched_by_call_id() {
    let mut host = host();
    let first_bridge = host.bridge.clone();
    let first = tokio::spawn(async move { first_bridge.get_tab(TabId(1)).await });
    let (first_id, _) = host.next_call().await;

    let second_bridge = host.bridge.clone();
    let second = tokio::spawn(async move { second_bridge.get_tab(TabId(2)).await });
    let (second_id, _) = host.next_call().await;
    assert_ne!(first_id, second_id);

    host.answer(second_id, json!({"id": 2, "windowId": 1, "index": 1}));
    host.answer(first_id, json!({"id": 1, "windowId": 1, "index": 0}));

    assert_eq!(first.await.unwrap().unwrap().id, TabId(1));
    assert_eq!(second.await.unwrap().unwrap().id, TabId(2));
}

#[tokio::test]
async fn test_unknown_call_id_is_ignored() {
    let host = host();
    assert!(!host.bridge.complete(999, Ok(Value::Null)));
    assert!(host
        .handler
        .handle_message(InboundMessage::PlatformResponse {
            call_id: 999,
            result: None,
            error: None,
        })
        .is_none());
}

#[tokio::test]
async fn test_disconnect_fails_pending_calls() {
    let mut host = host();
    let bridge = host.bridge.clone();
    let lookup = tokio::spawn(async move { bridge.get_tab(TabId(1)).await });
    host.next_call().await;
    assert_eq!(host.bridge.pending_calls(), 1);

    host.bridge.disconnect();

    assert!(matches!(
        lookup.await.unwrap(),
        Err(PlatformError::Disconnected)
    ));
    assert_eq!(host.bridge.pending_calls(), 0);
}

#[tokio::test]
async fn test_call_after_disconnect_fails_immediately() {
    let mut host = host();
    host.bridge.disconnect();

    assert!(matches!(
        host.bridge.get_tab(TabId(1)).await,
        Err(PlatformError::Disconnected)
    ));
    assert_eq!(host.bridge.pending_calls(), 0);
    assert!(host.rx.try_recv().is_err());
}

#[tokio::test]
async fn test_removal_adopts_browser_active_tab() {
    let mut host = host();
    host.activate(1, 1).await;
    host.activate(2, 1).await;

    let task = host.send(InboundMessage::TabRemoved { tab_id: TabId(2) });
    let (id, call) = host.next_call().await;
    assert_eq!(call, PlatformCall::QueryActiveTab { window_id: None });
    assert_eq!(host.app.tracker().current_tab_id(), None);
    host.answer(id, json!({"id": 1, "windowId": 1, "index": 0}));
    task.await.unwrap();

    assert_eq!(host.app.tracker().current_tab_id(), Some(TabId(1)));
    assert_eq!(host.app.tracker().history(), vec![TabId(1)]);
}

#[tokio::test]
async fn test_activation_during_removal_query_wins() {
    let mut host = host();
    host.activate(1, 1).await;
    host.activate(2, 1).await;

    let removal = host.send(InboundMessage::TabRemoved { tab_id: TabId(2) });
    let (id, call) = host.next_call().await;
    assert_eq!(call, PlatformCall::QueryActiveTab { window_id: None });

    host.activate(3, 1).await;
    host.answer(id, json!({"id": 3, "windowId": 1, "index": 0}));
    removal.await.unwrap();

    let tracker = host.app.tracker();
    assert_eq!(tracker.current_tab_id(), Some(TabId(3)));
    assert_eq!(tracker.history(), vec![TabId(1)]);
    assert_eq!(host.store.value("lasttab.tabHistory"), Some(json!([1])));
    assert_eq!(host.store.value("lasttab.currentTabId"), Some(json!(3)));
}

#[tokio::test]
async fn test_activation_during_focus_query_wins() {
    let mut host = host();
    host.activate(1, 1).await;

    let focus = host.send(InboundMessage::WindowFocusChanged { window_id: 2 });
    let (id, call) = host.next_call().await;
    assert_eq!(
        call,
        PlatformCall::QueryActiveTab {
            window_id: Some(WindowId(2))
        }
    );

    host.activate(6, 2).await;
    host.answer(id, json!({"id": 5, "windowId": 2, "index": 0}));
    focus.await.unwrap();

    let tracker = host.app.tracker();
    assert_eq!(tracker.current_tab_id(), Some(TabId(6)));
    assert_eq!(tracker.current_window_id(), Some(WindowId(2)));
    assert_eq!(tracker.history(), vec![TabId(1)]);
}

#[tokio::test]
async fn test_activation_during_seeding_wins() {
    let mut host = host();
    let seeding = host.send(InboundMessage::Startup);
    let (id, call) = host.next_call().await;
    assert_eq!(call, PlatformCall::QueryActiveTab { window_id: None });

    host.activate(7, 1).await;
    host.answer(id, json!({"id": 8, "windowId": 1, "index": 0}));
    seeding.await.unwrap();

    assert_eq!(host.app.tracker().current_tab_id(), Some(TabId(7)));
    assert!(host.app.tracker().history().is_empty());
}

#[tokio::test]
async fn test_shutdown_lets_pending_handlers_persist() {
    let mut host = host();
    host.activate(1, 1).await;
    host.activate(2, 1).await;
    host.activate(3, 1).await;

    let removal = host.send(InboundMessage::TabRemoved { tab_id: TabId(3) });
    let (_id, call) = host.next_call().await;
    assert_eq!(call, PlatformCall::QueryActiveTab { window_id: None });

    host.handler.shutdown(vec![removal]).await;

    assert_eq!(host.bridge.pending_calls(), 0);
    assert_eq!(host.store.value("lasttab.tabHistory"), Some(json!([2, 1])));
    assert_eq!(host.store.value("lasttab.currentTabId"), Some(json!(null)));
}
