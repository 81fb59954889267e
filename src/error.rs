//! Error types for the MCP weather bridge
//!
//! This module defines the error hierarchy shared by the frame server,
//! the session driver and the REST bridge.

use serde_json::Value;
use thiserror::Error;

/// Main error type for the MCP weather bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Network, timeout or non-2xx failures of an external call
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Malformed or non-conforming frame batches
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The invoked tool reported a domain error
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Caller-supplied arguments failed schema checks
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Caller did not present the configured API key
    #[error("Invalid API key")]
    Unauthorized,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures talking to another HTTP service
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("MCP upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request failed: {message}")]
    Request { message: String },
}

/// Frame-level protocol violations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("no tool result frame in response: {frames}")]
    NoToolResult { frames: String },

    #[error("Invalid reply body: {message}")]
    InvalidBody { message: String },
}

/// Errors reported by, or about, a tool
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("MCP tool error: {error}")]
    Failed { error: Value },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("MCP listTools error: {error}")]
    ListTools { error: Value },
}

/// Argument validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Arguments must be a JSON object")]
    NotAnObject,

    #[error("Missing required argument: {field}")]
    MissingField { field: String },

    #[error("Invalid argument '{field}': expected {expected}")]
    InvalidType { field: String, expected: String },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be at least {min}")]
    BelowMinimum { field: String, min: i64 },

    #[error("{field} must be at most {max}")]
    AboveMaximum { field: String, max: i64 },

    #[error("Unexpected argument: {field}")]
    UnexpectedField { field: String },

    #[error("Invalid request body: {message}")]
    InvalidRequest { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

impl BridgeError {
    /// Message carried by an `error` reply frame
    pub fn frame_message(&self) -> String {
        match self {
            BridgeError::Tool(e) => e.to_string(),
            BridgeError::Validation(e) => e.to_string(),
            other => format!("internal error: {other}"),
        }
    }
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            TransportError::Request {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Transport(TransportError::from(err))
    }
}
