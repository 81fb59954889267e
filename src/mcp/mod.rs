//! MCP (Model Context Protocol) module
//!
//! Implements the batched frame protocol: frame types, tool catalog,
//! frame server and client session driver.

pub mod driver;
pub mod schema;
pub mod server;
pub mod tools;
pub mod types;
