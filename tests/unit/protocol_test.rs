//! Unit tests for native-messaging framing and message shapes.

use lasttab::protocol::*;
use lasttab::types::action::{ActionRequest, ActionResponse};
use lasttab::types::errors::ProtocolError;
use lasttab::types::tab::{CreateTabRequest, TabId, WindowId};
use rstest::rstest;
use serde_json::json;

// === Inbound messages ===

#[rstest]
#[case(
    r#"{"type":"tab_activated","tabId":12,"windowId":3}"#,
    InboundMessage::TabActivated { tab_id: TabId(12), window_id: WindowId(3) }
)]
#[case(
    r#"{"type":"window_focus_changed","windowId":-1}"#,
    InboundMessage::WindowFocusChanged { window_id: -1 }
)]
#[case(
    r#"{"type":"tab_removed","tabId":8}"#,
    InboundMessage::TabRemoved { tab_id: TabId(8) }
)]
#[case(
    r#"{"type":"command","name":"duplicate-tab"}"#,
    InboundMessage::Command { name: "duplicate-tab".to_string() }
)]
#[case(r#"{"type":"startup"}"#, InboundMessage::Startup)]
#[case(r#"{"type":"installed"}"#, InboundMessage::Installed)]
#[case(
    r#"{"type":"action","requestId":5,"action":"getTabInfo"}"#,
    InboundMessage::Action { request_id: 5, action: ActionRequest::GetTabInfo }
)]
#[case(
    r#"{"type":"action","requestId":6,"action":"switchToLastTab"}"#,
    InboundMessage::Action { request_id: 6, action: ActionRequest::SwitchToLastTab }
)]
fn test_decode_inbound(#[case] raw: &str, #[case] expected: InboundMessage) {
    assert_eq!(decode_message(raw.as_bytes()).unwrap(), expected);
}

#[test]
fn test_decode_platform_response_variants() {
    let ok = decode_message(br#"{"type":"platform_response","callId":3,"result":{"id":1}}"#)
        .unwrap();
    assert_eq!(
        ok,
        InboundMessage::PlatformResponse {
            call_id: 3,
            result: Some(json!({"id": 1})),
            error: None,
        }
    );

    let missing = decode_message(
        br#"{"type":"platform_response","callId":4,"error":{"kind":"notFound"}}"#,
    )
    .unwrap();
    assert_eq!(
        missing,
        InboundMessage::PlatformResponse {
            call_id: 4,
            result: None,
            error: Some(RemoteError::NotFound),
        }
    );

    let failed = decode_message(
        br#"{"type":"platform_response","callId":5,"error":{"kind":"failed","message":"no"}}"#,
    )
    .unwrap();
    assert!(matches!(
        failed,
        InboundMessage::PlatformResponse {
            error: Some(RemoteError::Failed { .. }),
            ..
        }
    ));
}

#[rstest]
#[case(r#"{"type":"tab_exploded"}"#)]
#[case(r#"{"type":"tab_removed"}"#)]
#[case(r#"{"type":"action","requestId":1,"action":"closeAll"}"#)]
#[case("not json")]
fn test_decode_rejects_unknown_shapes(#[case] raw: &str) {
    assert!(matches!(
        decode_message(raw.as_bytes()),
        Err(ProtocolError::Malformed(_))
    ));
}

// === Outbound messages ===

#[test]
fn test_platform_call_shapes() {
    let get = OutboundMessage::PlatformCall {
        call_id: 1,
        call: PlatformCall::GetTab { tab_id: TabId(9) },
    };
    assert_eq!(
        serde_json::to_value(&get).unwrap(),
        json!({"type": "platform_call", "callId": 1, "call": {"op": "getTab", "tabId": 9}})
    );

    let query = PlatformCall::QueryActiveTab { window_id: None };
    assert_eq!(
        serde_json::to_value(&query).unwrap(),
        json!({"op": "queryActiveTab", "windowId": null})
    );

    let create = PlatformCall::CreateTab(CreateTabRequest {
        url: "https://example.com".to_string(),
        index: 3,
        active: true,
        window_id: Some(WindowId(2)),
    });
    assert_eq!(
        serde_json::to_value(&create).unwrap(),
        json!({"op": "createTab", "url": "https://example.com", "index": 3, "active": true, "windowId": 2})
    );
    assert_eq!(create.op(), "createTab");
}

#[test]
fn test_action_response_shape() {
    let message = OutboundMessage::ActionResponse {
        request_id: 7,
        response: ActionResponse::ack(),
    };
    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({"type": "action_response", "requestId": 7, "response": {"success": true}})
    );
}

// === Framing ===

#[tokio::test]
async fn test_frames_survive_a_pipe() {
    let (mut client, mut server) = tokio::io::duplex(4096);
    write_frame(&mut client, &json!({"type": "startup"})).await.unwrap();
    write_frame(&mut client, &json!({"type": "tab_removed", "tabId": 2}))
        .await
        .unwrap();
    drop(client);

    let first = read_frame(&mut server).await.unwrap().unwrap();
    assert_eq!(decode_message(&first).unwrap(), InboundMessage::Startup);
    let second = read_frame(&mut server).await.unwrap().unwrap();
    assert_eq!(
        decode_message(&second).unwrap(),
        InboundMessage::TabRemoved { tab_id: TabId(2) }
    );
    assert!(read_frame(&mut server).await.unwrap().is_none());
}

#[tokio::test]
async fn test_truncated_body_is_an_io_error() {
    let mut frame = 10u32.to_le_bytes().to_vec();
    frame.extend_from_slice(b"{\"a\"");
    let mut reader: &[u8] = &frame;
    assert!(matches!(
        read_frame(&mut reader).await,
        Err(ProtocolError::Io(_))
    ));
}

#[tokio::test]
async fn test_frame_at_size_limit_is_accepted() {
    let mut frame = (MAX_MESSAGE_SIZE as u32).to_le_bytes().to_vec();
    frame.resize(4 + MAX_MESSAGE_SIZE, b' ');
    let mut reader: &[u8] = &frame;
    let body = read_frame(&mut reader).await.unwrap().unwrap();
    assert_eq!(body.len(), MAX_MESSAGE_SIZE);
}
