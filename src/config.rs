//! Configuration management for the MCP weather bridge
//!
//! Settings are read once at process start and passed explicitly to the
//! frame server, the session driver and the REST bridge.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{BridgeError, ConfigError, Result};

/// Configuration for the MCP weather bridge
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address of the tool-serving frame server
    pub server_addr: String,

    /// Listen address of the REST bridge
    pub bridge_addr: String,

    /// Frame server the bridge relays batches to
    pub upstream_url: String,

    /// API key required in `X-API-Key` when set
    pub api_key: Option<String>,

    /// Protocol version sent by the driver and announced by the server
    pub protocol_version: String,

    /// Timeout for the relay call to the upstream frame server
    pub relay_timeout: Duration,

    /// Timeout for each geocoding / forecast call
    pub provider_timeout: Duration,

    /// Geocoding search endpoint
    pub geocoding_url: String,

    /// Daily forecast endpoint
    pub forecast_url: String,

    /// Whether the driver fails fast on an erroring `listTools` reply
    pub check_tool_list: bool,
}

impl Config {
    /// Build a configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            server_addr: get("MCP_SERVER_ADDR").unwrap_or(defaults.server_addr),
            bridge_addr: get("BRIDGE_ADDR").unwrap_or(defaults.bridge_addr),
            upstream_url: get("MCP_UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            api_key: get("API_KEY"),
            protocol_version: get("MCP_PROTOCOL_VERSION").unwrap_or(defaults.protocol_version),
            relay_timeout: parse_var::<u64>("RELAY_TIMEOUT_SECS", get("RELAY_TIMEOUT_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.relay_timeout),
            provider_timeout: parse_var::<u64>(
                "PROVIDER_TIMEOUT_SECS",
                get("PROVIDER_TIMEOUT_SECS"),
            )?
            .map(Duration::from_secs)
            .unwrap_or(defaults.provider_timeout),
            geocoding_url: get("GEOCODING_URL").unwrap_or(defaults.geocoding_url),
            forecast_url: get("FORECAST_URL").unwrap_or(defaults.forecast_url),
            check_tool_list: parse_var::<bool>("MCP_CHECK_TOOL_LIST", get("MCP_CHECK_TOOL_LIST"))?
                .unwrap_or(defaults.check_tool_list),
        })
    }
}

fn parse_var<T>(var: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.trim().parse::<T>().map_err(|e| {
            BridgeError::from(ConfigError::InvalidValue {
                var: var.to_string(),
                message: format!("{value:?}: {e}"),
            })
        })
    })
    .transpose()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: defaults::SERVER_ADDR.to_string(),
            bridge_addr: defaults::BRIDGE_ADDR.to_string(),
            upstream_url: defaults::UPSTREAM_URL.to_string(),
            api_key: None,
            protocol_version: defaults::PROTOCOL_VERSION.to_string(),
            relay_timeout: Duration::from_secs(defaults::RELAY_TIMEOUT_SECS),
            provider_timeout: Duration::from_secs(defaults::PROVIDER_TIMEOUT_SECS),
            geocoding_url: defaults::GEOCODING_URL.to_string(),
            forecast_url: defaults::FORECAST_URL.to_string(),
            check_tool_list: true,
        }
    }
}

/// Built-in defaults
pub mod defaults {
    pub const SERVER_ADDR: &str = "0.0.0.0:8017";
    pub const BRIDGE_ADDR: &str = "0.0.0.0:8000";
    pub const UPSTREAM_URL: &str = "http://localhost:8017/mcp";
    pub const PROTOCOL_VERSION: &str = "2024-11-07";
    pub const RELAY_TIMEOUT_SECS: u64 = 60;
    pub const PROVIDER_TIMEOUT_SECS: u64 = 30;

    /// Open-Meteo geocoding search
    pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

    /// Open-Meteo daily forecast
    pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
}
