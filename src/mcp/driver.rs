//! MCP session driver
//!
//! Drives one tool call through the `initialize` → `listTools` → `callTool`
//! → `shutdown` handshake as a single batch, then picks the call's result
//! out of the reply batch.
//!
//! Reply correlation is a two-phase policy:
//!
//! 1. **By id**: the frame whose `inReplyTo` equals the `callTool` id.
//! 2. **Positional fallback**: only when phase 1 finds nothing, the first
//!    frame typed `toolResult`, `result` or `response`. This recovers from
//!    servers that omit `inReplyTo`.

use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ProtocolError, Result, ToolError, TransportError};
use crate::mcp::types::{decode_reply_body, Capabilities, Frame, FrameType};

/// Frame types accepted by the positional fallback
const FALLBACK_RESULT_TYPES: [&str; 3] = ["toolResult", "result", "response"];

/// How the call's reply frame was located
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    ById,
    Positional,
}

/// Correlation ids of one session batch, one per frame role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIds {
    pub initialize: String,
    pub list_tools: String,
    pub call_tool: String,
    pub shutdown: String,
}

impl SessionIds {
    /// Generate four fresh ids
    pub fn generate() -> Self {
        Self {
            initialize: Uuid::new_v4().to_string(),
            list_tools: Uuid::new_v4().to_string(),
            call_tool: Uuid::new_v4().to_string(),
            shutdown: Uuid::new_v4().to_string(),
        }
    }
}

/// Build the ordered four-frame session batch
pub fn session_frames(
    ids: &SessionIds,
    protocol_version: &str,
    tool: &str,
    args: &Map<String, Value>,
) -> Vec<Frame> {
    let capabilities = Capabilities {
        tools: true,
        resources: true,
    };

    vec![
        Frame::request(FrameType::Initialize, &ids.initialize)
            .with("protocolVersion", json!(protocol_version))
            .with("capabilities", json!(capabilities)),
        Frame::request(FrameType::ListTools, &ids.list_tools),
        Frame::request(FrameType::CallTool, &ids.call_tool)
            .with("name", json!(tool))
            .with("arguments", Value::Object(args.clone())),
        Frame::request(FrameType::Shutdown, &ids.shutdown),
    ]
}

/// Locate the reply to the `callTool` frame
pub fn find_call_reply<'a>(frames: &'a [Frame], call_id: &str) -> Option<(&'a Frame, MatchPhase)> {
    if let Some(frame) = frames.iter().find(|f| f.replies_to(call_id)) {
        return Some((frame, MatchPhase::ById));
    }

    frames
        .iter()
        .find(|f| FALLBACK_RESULT_TYPES.contains(&f.kind.as_str()))
        .map(|frame| (frame, MatchPhase::Positional))
}

/// Fail if the `listTools` reply carries an error
pub fn check_tool_list(frames: &[Frame], list_id: &str) -> Result<()> {
    let reply = frames.iter().find(|f| f.replies_to(list_id));

    match reply.and_then(|f| f.field("error")) {
        Some(error) => Err(ToolError::ListTools {
            error: error.clone(),
        }
        .into()),
        None => Ok(()),
    }
}

/// Payload of a matched reply: `result`, else `content`, else the whole frame
pub fn extract_payload(frame: &Frame) -> Result<Value> {
    if let Some(value) = frame.field("result").or_else(|| frame.field("content")) {
        return Ok(value.clone());
    }
    Ok(serde_json::to_value(frame)?)
}

/// Resolve the call payload from a decoded reply batch
pub fn extract_tool_result(frames: &[Frame], ids: &SessionIds, check_tools: bool) -> Result<Value> {
    if check_tools {
        check_tool_list(frames, &ids.list_tools)?;
    }

    let Some((frame, phase)) = find_call_reply(frames, &ids.call_tool) else {
        return Err(ProtocolError::NoToolResult {
            frames: serde_json::to_string(frames)?,
        }
        .into());
    };

    if phase == MatchPhase::Positional {
        warn!(kind = %frame.kind, "No reply matched the callTool id, using positional fallback");
    }

    if frame.kind == FrameType::Error {
        return Err(ToolError::Failed {
            error: frame.field("error").cloned().unwrap_or(Value::Null),
        }
        .into());
    }

    extract_payload(frame)
}

/// Client-side session driver
pub struct SessionDriver {
    /// HTTP client
    http_client: reqwest::Client,

    /// Frame server endpoint
    upstream_url: String,

    protocol_version: String,

    timeout: Duration,

    check_tool_list: bool,
}

impl SessionDriver {
    /// Create a new driver from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            upstream_url: config.upstream_url.clone(),
            protocol_version: config.protocol_version.clone(),
            timeout: config.relay_timeout,
            check_tool_list: config.check_tool_list,
        }
    }

    /// Frame server endpoint this driver posts to
    pub fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    /// Run one tool call and return its payload.
    ///
    /// Exactly one batch request is sent; there is no retry.
    pub async fn invoke(&self, tool: &str, args: &Map<String, Value>) -> Result<Value> {
        let ids = SessionIds::generate();
        let frames = session_frames(&ids, &self.protocol_version, tool, args);
        debug!(tool, call_id = %ids.call_tool, url = %self.upstream_url, "Sending session batch");

        let response = self
            .http_client
            .post(&self.upstream_url)
            .json(&frames)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Upstream {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let replies = decode_reply_body(&body)?;
        extract_tool_result(&replies, &ids, self.check_tool_list)
    }
}
