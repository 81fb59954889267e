//! MCP Weather Bridge Library
//!
//! A minimal batched frame protocol ("MCP") for tool invocation: a frame
//! server hosting the `get_forecast` tool, a session driver that runs one
//! tool call per batch, and a REST bridge in front of the driver.

pub mod bridge;
pub mod config;
pub mod error;
pub mod mcp;
pub mod weather;

pub use config::Config;
pub use error::{BridgeError, Result};
