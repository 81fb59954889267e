//! REST bridge
//!
//! Exposes `POST /mcp/call` and relays each call to the upstream frame
//! server through a [`SessionDriver`].

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{BridgeError, Result, TransportError, ValidationError};
use crate::mcp::driver::SessionDriver;

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Request body of `POST /mcp/call`
#[derive(Debug, Clone, Deserialize)]
pub struct CallBody {
    /// Tool name, e.g. `get_forecast`
    pub tool: String,

    /// Tool arguments
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// Success body of `POST /mcp/call`
#[derive(Debug, Clone, Serialize)]
pub struct CallResponse {
    pub ok: bool,
    pub tool: String,
    pub args: Map<String, Value>,
    pub data: Value,
}

/// Shared bridge state
pub struct BridgeState {
    driver: SessionDriver,
    api_key: Option<String>,
}

impl BridgeState {
    pub fn new(config: &Config) -> Self {
        Self {
            driver: SessionDriver::new(config),
            api_key: config.api_key.clone(),
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<()> {
        let Some(expected) = self.api_key.as_deref() else {
            return Ok(());
        };

        let presented = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
        if presented == Some(expected) {
            Ok(())
        } else {
            warn!("Rejected call: invalid API key");
            Err(BridgeError::Unauthorized)
        }
    }
}

impl BridgeError {
    /// HTTP status surfaced to REST callers
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::Transport(TransportError::Upstream { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            BridgeError::Transport(_) | BridgeError::Protocol(_) => StatusCode::BAD_GATEWAY,
            BridgeError::Tool(_) | BridgeError::Validation(_) => StatusCode::BAD_REQUEST,
            BridgeError::Unauthorized => StatusCode::UNAUTHORIZED,
            BridgeError::Config(_) | BridgeError::Io(_) | BridgeError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for BridgeError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::InvalidRequest {
            message: rejection.body_text(),
        }
        .into()
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Bridge call failed");
        }
        (status, Json(json!({"ok": false, "error": self.to_string()}))).into_response()
    }
}

/// Build the REST router (`POST /mcp/call`, `GET /health`)
pub fn router(state: Arc<BridgeState>) -> Router {
    Router::new()
        .route("/mcp/call", post(mcp_call))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the REST bridge until the listener fails
pub async fn serve(config: &Config, addr: &str) -> Result<()> {
    let state = Arc::new(BridgeState::new(config));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        addr = %listener.local_addr()?,
        upstream = %state.driver.upstream_url(),
        "MCP REST bridge listening"
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn mcp_call(
    State(state): State<Arc<BridgeState>>,
    headers: HeaderMap,
    body: std::result::Result<Json<CallBody>, JsonRejection>,
) -> Result<Json<CallResponse>> {
    state.authorize(&headers)?;
    let Json(body) = body?;

    info!(tool = %body.tool, "Relaying tool call");
    let data = state.driver.invoke(&body.tool, &body.args).await?;

    Ok(Json(CallResponse {
        ok: true,
        tool: body.tool,
        args: body.args,
        data,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}
