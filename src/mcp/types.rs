//! MCP frame type definitions
//!
//! Types for the batched frame protocol exchanged between the session
//! driver and the frame server.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProtocolError, Result};
use crate::mcp::schema::InputSchema;

/// Frame type tag
///
/// Request tags are `initialize`, `listTools`, `callTool` and `shutdown`;
/// the rest are reply tags. Any other tag decodes as `Unrecognized` and
/// keeps its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FrameType {
    Initialize,
    ListTools,
    CallTool,
    Shutdown,
    Initialized,
    Tools,
    ToolResult,
    Error,
    Ok,
    Unrecognized(String),
}

impl FrameType {
    /// Wire tag of this frame type
    pub fn as_str(&self) -> &str {
        match self {
            FrameType::Initialize => "initialize",
            FrameType::ListTools => "listTools",
            FrameType::CallTool => "callTool",
            FrameType::Shutdown => "shutdown",
            FrameType::Initialized => "initialized",
            FrameType::Tools => "tools",
            FrameType::ToolResult => "toolResult",
            FrameType::Error => "error",
            FrameType::Ok => "ok",
            FrameType::Unrecognized(tag) => tag,
        }
    }
}

impl Default for FrameType {
    fn default() -> Self {
        FrameType::Unrecognized(String::new())
    }
}

impl From<String> for FrameType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "initialize" => FrameType::Initialize,
            "listTools" => FrameType::ListTools,
            "callTool" => FrameType::CallTool,
            "shutdown" => FrameType::Shutdown,
            "initialized" => FrameType::Initialized,
            "tools" => FrameType::Tools,
            "toolResult" => FrameType::ToolResult,
            "error" => FrameType::Error,
            "ok" => FrameType::Ok,
            _ => FrameType::Unrecognized(tag),
        }
    }
}

impl From<FrameType> for String {
    fn from(kind: FrameType) -> Self {
        match kind {
            FrameType::Unrecognized(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One protocol frame, request or reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame type tag
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    pub kind: FrameType,

    /// Correlation id assigned by the sender of a request frame.
    ///
    /// Kept as raw JSON so a non-string id is still echoed back verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Id of the request frame this reply answers
    #[serde(
        rename = "inReplyTo",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub in_reply_to: Option<Value>,

    /// Type-specific fields (`protocolVersion`, `name`, `result`, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Frame {
    /// Create a request frame
    pub fn request(kind: FrameType, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(Value::String(id.into())),
            in_reply_to: None,
            fields: Map::new(),
        }
    }

    /// Create a reply frame answering `fid`
    pub fn reply(kind: FrameType, fid: impl Into<Value>) -> Self {
        Self {
            kind,
            id: None,
            in_reply_to: Some(fid.into()),
            fields: Map::new(),
        }
    }

    /// Create an `error` reply carrying a message
    pub fn error_reply(fid: impl Into<Value>, message: impl Into<String>) -> Self {
        Self::reply(FrameType::Error, fid).with("error", Value::String(message.into()))
    }

    /// Set a type-specific field
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Look up a type-specific field, treating `null` as absent
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// Look up a string field
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// `inReplyTo` as a string, if it is one
    pub fn in_reply_to_str(&self) -> Option<&str> {
        self.in_reply_to.as_ref().and_then(Value::as_str)
    }

    /// Whether this frame answers the request with id `id`
    pub fn replies_to(&self, id: &str) -> bool {
        self.in_reply_to_str() == Some(id)
    }
}

/// Decode a `type` tag, mapping `null` and non-string tags to `Unrecognized`
fn lenient_kind<'de, D>(deserializer: D) -> std::result::Result<FrameType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(tag) => FrameType::from(tag),
        other => FrameType::Unrecognized(other.to_string()),
    })
}

/// Server info announced in `initialized`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,

    /// Server version
    pub version: String,
}

/// Capability flags exchanged during `initialize`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Capabilities {
    #[serde(default)]
    pub tools: bool,

    #[serde(default)]
    pub resources: bool,
}

/// Tool catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Restricted JSON Schema for the tool arguments
    pub input_schema: InputSchema,
}

/// Decode a reply body into frames.
///
/// Accepts either an array of frames or a single frame object. Elements
/// that are not JSON objects are skipped; every object decodes.
pub fn decode_reply_body(body: &str) -> Result<Vec<Frame>> {
    let value: Value = serde_json::from_str(body).map_err(|e| ProtocolError::InvalidBody {
        message: e.to_string(),
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        other => {
            return Err(ProtocolError::InvalidBody {
                message: format!("expected a frame or an array of frames, got {other}"),
            }
            .into())
        }
    };

    let frames = items
        .into_iter()
        .filter(Value::is_object)
        .map(serde_json::from_value)
        .collect::<std::result::Result<Vec<Frame>, _>>()?;
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_deserialize() {
        let json = r#"{"type":"callTool","id":"c1","name":"get_forecast","arguments":{"city":"Bangkok"}}"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.kind, FrameType::CallTool);
        assert_eq!(frame.id, Some(json!("c1")));
        assert_eq!(frame.str_field("name"), Some("get_forecast"));
        assert_eq!(frame.field("arguments"), Some(&json!({"city": "Bangkok"})));
    }

    #[test]
    fn test_reply_serialize() {
        let frame = Frame::reply(FrameType::Ok, "s1");
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value, json!({"type": "ok", "inReplyTo": "s1"}));
    }

    #[test]
    fn test_unrecognized_tag_is_preserved() {
        let frame: Frame = serde_json::from_value(json!({"type": "ping", "id": "p"})).unwrap();
        assert_eq!(frame.kind, FrameType::Unrecognized("ping".to_string()));
        assert_eq!(serde_json::to_value(&frame).unwrap()["type"], "ping");
    }

    #[test]
    fn test_missing_type_decodes_as_unrecognized() {
        let frame: Frame = serde_json::from_value(json!({"result": 1})).unwrap();
        assert_eq!(frame.kind, FrameType::default());
    }

    #[test]
    fn test_loose_fields_still_decode() {
        let frame: Frame =
            serde_json::from_value(json!({"type": null, "id": 5, "inReplyTo": 7})).unwrap();
        assert_eq!(frame.kind, FrameType::Unrecognized("null".to_string()));
        assert_eq!(frame.id, Some(json!(5)));
        assert_eq!(frame.in_reply_to, Some(json!(7)));
        assert!(!frame.replies_to("7"));

        let frame: Frame = serde_json::from_value(json!({"type": 3})).unwrap();
        assert_eq!(frame.kind.as_str(), "3");
    }

    #[test]
    fn test_decode_keeps_reply_with_numeric_id() {
        let frames = decode_reply_body(
            r#"[{"type":"toolResult","inReplyTo":"c","id":1,"result":{"x":1}}]"#,
        )
        .unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].replies_to("c"));
        assert_eq!(frames[0].id, Some(json!(1)));
    }

    #[test]
    fn test_batch_encode_decode_identity() {
        let frames = vec![
            Frame::request(FrameType::Initialize, "i")
                .with("protocolVersion", json!("2024-11-07"))
                .with("capabilities", json!({"tools": true, "resources": true})),
            Frame::request(FrameType::CallTool, "c")
                .with("name", json!("get_forecast"))
                .with("arguments", json!({"city": "Oslo", "days": 2})),
            Frame::error_reply("c", "boom"),
        ];
        let text = serde_json::to_string(&frames).unwrap();
        assert_eq!(decode_reply_body(&text).unwrap(), frames);
    }

    #[test]
    fn test_decode_single_object_body() {
        let frames = decode_reply_body(r#"{"type":"toolResult","result":{"x":1}}"#).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameType::ToolResult);
    }

    #[test]
    fn test_decode_skips_non_objects() {
        let frames = decode_reply_body(r#"[1, "x", {"type":"ok","inReplyTo":"s"}]"#).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_decode_rejects_scalar_body() {
        assert!(decode_reply_body("42").is_err());
        assert!(decode_reply_body("not json").is_err());
    }
}
