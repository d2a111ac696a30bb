//! Native-messaging wire protocol between the extension and `lasttab-host`.
//!
//! Each frame is a 4-byte little-endian length followed by that many bytes
//! of UTF-8 JSON. The browser caps host-bound frames at 1 MiB.
//!
//! Inbound (extension → host):
//! ```text
//! {"type":"tab_activated","tabId":12,"windowId":1}
//! {"type":"window_focus_changed","windowId":-1}
//! {"type":"tab_removed","tabId":12}
//! {"type":"command","name":"switch-to-last-tab"}
//! {"type":"startup"} / {"type":"installed"}
//! {"type":"action","requestId":7,"action":"getTabInfo"}
//! {"type":"platform_response","callId":3,"result":{...}}
//! {"type":"platform_response","callId":4,"error":{"kind":"notFound"}}
//! ```
//!
//! Outbound (host → extension):
//! ```text
//! {"type":"platform_call","callId":3,"call":{"op":"getTab","tabId":12}}
//! {"type":"action_response","requestId":7,"response":{"success":true}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::types::action::{ActionRequest, ActionResponse};
use crate::types::errors::ProtocolError;
use crate::types::tab::{CreateTabRequest, TabId, WindowId};

/// Largest frame accepted from the browser.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Message received from the extension.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    #[serde(rename_all = "camelCase")]
    TabActivated { tab_id: TabId, window_id: WindowId },
    /// Raw window id; `-1` means no browser window has focus.
    #[serde(rename_all = "camelCase")]
    WindowFocusChanged { window_id: i64 },
    #[serde(rename_all = "camelCase")]
    TabRemoved { tab_id: TabId },
    Command { name: String },
    Startup,
    Installed,
    #[serde(rename_all = "camelCase")]
    Action {
        request_id: u64,
        action: ActionRequest,
    },
    #[serde(rename_all = "camelCase")]
    PlatformResponse {
        call_id: u64,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<RemoteError>,
    },
}

/// Failure reported by the extension for a platform call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RemoteError {
    /// The tab or window the call referred to does not exist.
    NotFound,
    Failed { message: String },
}

/// Platform operation the host asks the extension to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PlatformCall {
    #[serde(rename_all = "camelCase")]
    QueryActiveTab { window_id: Option<WindowId> },
    #[serde(rename_all = "camelCase")]
    GetTab { tab_id: TabId },
    #[serde(rename_all = "camelCase")]
    UpdateTab { tab_id: TabId, active: bool },
    #[serde(rename_all = "camelCase")]
    UpdateWindow { window_id: WindowId, focused: bool },
    CreateTab(CreateTabRequest),
}

impl PlatformCall {
    /// Operation name, as used in log lines.
    pub fn op(&self) -> &'static str {
        match self {
            PlatformCall::QueryActiveTab { .. } => "queryActiveTab",
            PlatformCall::GetTab { .. } => "getTab",
            PlatformCall::UpdateTab { .. } => "updateTab",
            PlatformCall::UpdateWindow { .. } => "updateWindow",
            PlatformCall::CreateTab(_) => "createTab",
        }
    }
}

/// Message sent to the extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    #[serde(rename_all = "camelCase")]
    PlatformCall { call_id: u64, call: PlatformCall },
    #[serde(rename_all = "camelCase")]
    ActionResponse {
        request_id: u64,
        response: ActionResponse,
    },
}

/// Parses one frame body.
pub fn decode_message(body: &[u8]) -> Result<InboundMessage, ProtocolError> {
    serde_json::from_slice(body).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Reads one frame body. Returns `None` on a clean end of stream.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<Vec<u8>>, ProtocolError> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = usize::try_from(u32::from_le_bytes(len_bytes))
        .map_err(|_| ProtocolError::MessageTooLarge(usize::MAX))?;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Encodes `message` as a length-prefixed frame.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(message).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    let len = u32::try_from(json.len()).map_err(|_| ProtocolError::MessageTooLarge(json.len()))?;

    let mut frame = Vec::with_capacity(json.len() + 4);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&json);
    Ok(frame)
}

/// Writes `message` as one frame and flushes.
pub async fn write_frame<W: AsyncWrite + Unpin, T: Serialize>(
    writer: &mut W,
    message: &T,
) -> Result<(), ProtocolError> {
    let frame = encode_frame(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
