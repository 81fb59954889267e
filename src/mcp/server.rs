//! MCP frame server implementation
//!
//! Receives a batch of frames over HTTP, dispatches each by type and answers
//! with one reply frame per request frame.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::future::join_all;
use serde_json::{json, Map, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;
use crate::weather::client::ForecastProvider;

/// MCP server info
const SERVER_NAME: &str = "mcp-weather-forecast";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Frame server for the weather tools
pub struct FrameServer {
    /// Tool handler
    tool_handler: ToolHandler,

    /// Version announced when the client does not request one
    protocol_version: String,
}

impl FrameServer {
    /// Create a new frame server
    pub fn new(config: &Config, provider: Arc<dyn ForecastProvider>) -> Self {
        Self {
            tool_handler: ToolHandler::new(provider),
            protocol_version: config.protocol_version.clone(),
        }
    }

    /// Handle one batch.
    ///
    /// Every input element yields exactly one reply, in input order. Frames
    /// are independent: a `callTool` without a prior `initialize` is still served.
    pub async fn handle_batch(&self, frames: Vec<Value>) -> Vec<Frame> {
        info!(frames = frames.len(), "Handling frame batch");
        join_all(frames.into_iter().map(|raw| self.handle_raw(raw))).await
    }

    async fn handle_raw(&self, raw: Value) -> Frame {
        let frame = match raw {
            Value::Object(_) => serde_json::from_value::<Frame>(raw),
            other => {
                return Frame::error_reply(new_frame_id(), format!("Malformed frame: {other}"));
            }
        };

        match frame {
            Ok(frame) => self.handle_frame(frame).await,
            Err(e) => Frame::error_reply(new_frame_id(), format!("Malformed frame: {e}")),
        }
    }

    /// Id replies to `frame` carry: its own `id` echoed verbatim, or a fresh
    /// one when the id is absent, `null` or an empty string
    fn reply_id(frame: &Frame) -> Value {
        match &frame.id {
            None | Some(Value::Null) => new_frame_id(),
            Some(Value::String(id)) if id.is_empty() => new_frame_id(),
            Some(id) => id.clone(),
        }
    }

    /// Dispatch a single frame
    pub async fn handle_frame(&self, frame: Frame) -> Frame {
        let fid = Self::reply_id(&frame);
        debug!(kind = %frame.kind, fid = %fid, "Dispatching frame");

        match &frame.kind {
            FrameType::Initialize => self.handle_initialize(&frame, fid),
            FrameType::ListTools => self.handle_list_tools(fid),
            FrameType::CallTool => self.handle_call_tool(&frame, fid).await,
            FrameType::Shutdown => Frame::reply(FrameType::Ok, fid),
            FrameType::Initialized
            | FrameType::Tools
            | FrameType::ToolResult
            | FrameType::Error
            | FrameType::Ok
            | FrameType::Unrecognized(_) => {
                Frame::error_reply(fid, format!("Unknown frame type: {}", frame.kind))
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, frame: &Frame, fid: Value) -> Frame {
        let protocol_version = frame
            .str_field("protocolVersion")
            .unwrap_or(&self.protocol_version);
        let server_info = ServerInfo {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
        };
        let capabilities = Capabilities {
            tools: true,
            resources: false,
        };

        Frame::reply(FrameType::Initialized, fid)
            .with("protocolVersion", json!(protocol_version))
            .with("serverInfo", json!(server_info))
            .with("capabilities", json!(capabilities))
    }

    /// Handle list tools request
    fn handle_list_tools(&self, fid: Value) -> Frame {
        Frame::reply(FrameType::Tools, fid).with("tools", json!(self.tool_handler.list_tools()))
    }

    /// Handle call tool request
    async fn handle_call_tool(&self, frame: &Frame, fid: Value) -> Frame {
        let name = frame.str_field("name").unwrap_or_default();
        let args = frame
            .field("arguments")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        match self.tool_handler.call_tool(name, args).await {
            Ok(result) => Frame::reply(FrameType::ToolResult, fid).with("result", result),
            Err(e) => {
                debug!(tool = name, error = %e, "Tool call failed");
                Frame::error_reply(fid, e.frame_message())
            }
        }
    }
}

fn new_frame_id() -> Value {
    Value::String(Uuid::new_v4().to_string())
}

// ==================== HTTP Surface ====================

/// Build the tool-serving router (`POST /mcp`, `GET /health`)
pub fn router(server: Arc<FrameServer>) -> Router {
    Router::new()
        .route("/mcp", post(mcp_endpoint))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Run the frame server until the listener fails
pub async fn serve(config: &Config, addr: &str, provider: Arc<dyn ForecastProvider>) -> Result<()> {
    let server = Arc::new(FrameServer::new(config, provider));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "MCP frame server listening");
    axum::serve(listener, router(server)).await?;
    Ok(())
}

async fn mcp_endpoint(State(server): State<Arc<FrameServer>>, body: Bytes) -> Response {
    let frames: Vec<Value> = match serde_json::from_slice(&body) {
        Ok(frames) => frames,
        Err(e) => {
            debug!(error = %e, "Rejecting batch");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Payload must be a JSON array of frames"})),
            )
                .into_response();
        }
    };

    Json(server.handle_batch(frames).await).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "version": SERVER_VERSION}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::mcp::tools::tests::FakeProvider;

    fn server() -> (Arc<FakeProvider>, FrameServer) {
        let provider = Arc::new(FakeProvider::default());
        let server = FrameServer::new(&Config::default(), provider.clone());
        (provider, server)
    }

    fn call(id: &str, args: Value) -> Value {
        json!({"type": "callTool", "id": id, "name": "get_forecast", "arguments": args})
    }

    #[tokio::test]
    async fn test_full_session_batch() {
        let (_, server) = server();
        let replies = server
            .handle_batch(vec![
                json!({"type": "initialize", "id": "i", "protocolVersion": "2025-01-01"}),
                json!({"type": "listTools", "id": "l"}),
                call("c", json!({"city": "Bangkok", "days": 5})),
                json!({"type": "shutdown", "id": "s"}),
            ])
            .await;

        assert_eq!(replies.len(), 4);
        let kinds: Vec<_> = replies.iter().map(|f| f.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![FrameType::Initialized, FrameType::Tools, FrameType::ToolResult, FrameType::Ok]
        );
        let ids: Vec<_> = replies.iter().map(|f| f.in_reply_to_str().unwrap()).collect();
        assert_eq!(ids, vec!["i", "l", "c", "s"]);

        assert_eq!(replies[0].str_field("protocolVersion"), Some("2025-01-01"));
        assert_eq!(replies[0].field("serverInfo").unwrap()["name"], SERVER_NAME);
        assert_eq!(replies[1].field("tools").unwrap()[0]["name"], "get_forecast");
        assert_eq!(replies[2].field("result").unwrap()["days"], 5);
    }

    #[tokio::test]
    async fn test_initialize_defaults_protocol_version() {
        let (_, server) = server();
        let replies = server.handle_batch(vec![json!({"type": "initialize", "id": "i"})]).await;
        assert_eq!(replies[0].str_field("protocolVersion"), Some("2024-11-07"));
    }

    #[tokio::test]
    async fn test_call_tool_without_handshake() {
        let (_, server) = server();
        for days in 1..=7 {
            let replies = server
                .handle_batch(vec![call("c", json!({"city": "Bangkok", "days": days}))])
                .await;
            assert_eq!(replies.len(), 1);
            assert_eq!(replies[0].kind, FrameType::ToolResult);
            assert!(replies[0].replies_to("c"));
            let result = replies[0].field("result").unwrap();
            assert_eq!(result["daily"].as_array().unwrap().len(), days as usize);
        }
    }

    #[tokio::test]
    async fn test_out_of_range_days_skip_provider() {
        let (provider, server) = server();
        for days in [0, 8, -3] {
            let replies = server
                .handle_batch(vec![call("c", json!({"city": "Bangkok", "days": days}))])
                .await;
            assert_eq!(replies[0].kind, FrameType::Error);
            assert_eq!(replies[0].str_field("error"), Some("days must be between 1 and 7"));
        }
        assert_eq!(provider.geocode_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.forecast_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (provider, server) = server();
        let replies = server
            .handle_batch(vec![json!({"type": "callTool", "id": "c", "name": "get_tides"})])
            .await;
        assert_eq!(replies[0].kind, FrameType::Error);
        assert_eq!(replies[0].str_field("error"), Some("Unknown tool: get_tides"));
        assert_eq!(provider.geocode_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_city_not_found_is_error_frame() {
        let (_, server) = server();
        let replies = server
            .handle_batch(vec![call("c", json!({"city": "Atlantis"}))])
            .await;
        assert_eq!(replies[0].kind, FrameType::Error);
        assert_eq!(replies[0].str_field("error"), Some("City 'Atlantis' not found"));
    }

    #[tokio::test]
    async fn test_unknown_frame_type() {
        let (_, server) = server();
        let replies = server
            .handle_batch(vec![
                json!({"type": "ping", "id": "p"}),
                json!({"type": "toolResult", "id": "t"}),
            ])
            .await;
        assert_eq!(replies[0].str_field("error"), Some("Unknown frame type: ping"));
        assert_eq!(replies[1].str_field("error"), Some("Unknown frame type: toolResult"));
    }

    #[tokio::test]
    async fn test_missing_id_gets_generated_fid() {
        let (_, server) = server();
        let replies = server.handle_batch(vec![json!({"type": "shutdown"})]).await;
        assert_eq!(replies[0].kind, FrameType::Ok);
        let fid = replies[0].in_reply_to_str().unwrap();
        assert!(Uuid::parse_str(fid).is_ok());

        let replies = server
            .handle_batch(vec![json!({"type": "shutdown", "id": null}), json!({"type": "shutdown", "id": ""})])
            .await;
        for reply in &replies {
            assert!(Uuid::parse_str(reply.in_reply_to_str().unwrap()).is_ok());
        }
    }

    #[tokio::test]
    async fn test_malformed_elements_do_not_abort_batch() {
        let (_, server) = server();
        let replies = server
            .handle_batch(vec![
                json!(17),
                json!({"type": "shutdown", "id": 5}),
                json!({"type": null, "id": "x"}),
                json!({"type": "shutdown", "id": "s"}),
            ])
            .await;
        assert_eq!(replies.len(), 4);
        assert_eq!(replies[0].kind, FrameType::Error);
        assert!(replies[0].str_field("error").unwrap().starts_with("Malformed frame"));

        // A numeric id is echoed back as-is.
        assert_eq!(replies[1].kind, FrameType::Ok);
        assert_eq!(replies[1].in_reply_to, Some(json!(5)));

        assert_eq!(replies[2].kind, FrameType::Error);
        assert!(replies[2].replies_to("x"));
        assert_eq!(replies[2].str_field("error"), Some("Unknown frame type: null"));

        assert_eq!(replies[3].kind, FrameType::Ok);
    }

    #[tokio::test]
    async fn test_provider_failure_is_isolated_to_its_frame() {
        let (_, server) = server();
        let replies = server
            .handle_batch(vec![
                call("bad", json!({"city": "Gotham"})),
                call("good", json!({"city": "Bangkok", "days": 2})),
                json!({"type": "shutdown", "id": "s"}),
            ])
            .await;
        assert_eq!(replies.len(), 3);

        assert_eq!(replies[0].kind, FrameType::Error);
        assert!(replies[0].replies_to("bad"));
        let message = replies[0].str_field("error").unwrap();
        assert!(message.starts_with("internal error:"), "{message}");
        assert!(message.contains("503"));

        assert_eq!(replies[1].kind, FrameType::ToolResult);
        assert_eq!(replies[1].field("result").unwrap()["days"], 2);
        assert_eq!(replies[2].kind, FrameType::Ok);
    }
}
