//! MCP Weather Bridge - Rust Implementation
//!
//! Runs either the tool-serving frame server or the REST bridge that
//! relays calls to it.

use std::sync::Arc;

use anyhow::{bail, Context};
use serde_json::{Map, Value};
use clap::{Parser, Subcommand};

use mcp_weather_bridge::bridge;
use mcp_weather_bridge::config::Config;
use mcp_weather_bridge::mcp::driver::SessionDriver;
use mcp_weather_bridge::mcp::server;
use mcp_weather_bridge::weather::client::OpenMeteoClient;
use mcp_weather_bridge::weather::types::ForecastReport;

/// MCP Weather Bridge
#[derive(Parser)]
#[command(name = "mcp-weather-bridge")]
#[command(author, version, about = "MCP Weather Bridge - frame server and REST relay for weather tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the weather tools over the frame protocol (POST /mcp)
    Server {
        /// Listen address, overrides MCP_SERVER_ADDR
        #[arg(long)]
        bind: Option<String>,
    },

    /// Serve the REST endpoint (POST /mcp/call) relaying to MCP_UPSTREAM_URL
    Bridge {
        /// Listen address, overrides BRIDGE_ADDR
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run one tool call against a frame server and print the result
    Call {
        /// Tool name
        #[arg(default_value = "get_forecast")]
        tool: String,

        /// Tool arguments as a JSON object, e.g. '{"city":"Bangkok","days":5}'
        #[arg(long)]
        args: Option<String>,

        /// Frame server endpoint, overrides MCP_UPSTREAM_URL
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command {
        Commands::Server { bind } => {
            let addr = bind.unwrap_or_else(|| config.server_addr.clone());
            let provider = Arc::new(OpenMeteoClient::new(&config));
            server::serve(&config, &addr, provider)
                .await
                .with_context(|| format!("frame server on {addr} failed"))?;
        }
        Commands::Bridge { bind } => {
            let addr = bind.unwrap_or_else(|| config.bridge_addr.clone());
            bridge::serve(&config, &addr)
                .await
                .with_context(|| format!("REST bridge on {addr} failed"))?;
        }
        Commands::Call { tool, args, url } => {
            let mut config = config;
            if let Some(url) = url {
                config.upstream_url = url;
            }
            let args = parse_args(args.as_deref())?;

            let driver = SessionDriver::new(&config);
            let payload = driver
                .invoke(&tool, &args)
                .await
                .with_context(|| format!("{tool} call via {} failed", driver.upstream_url()))?;
            print_payload(payload)?;
        }
    }

    Ok(())
}

fn parse_args(raw: Option<&str>) -> anyhow::Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str(raw).context("--args is not valid JSON")? {
        Value::Object(args) => Ok(args),
        other => bail!("--args must be a JSON object, got {other}"),
    }
}

fn print_payload(payload: Value) -> anyhow::Result<()> {
    match serde_json::from_value::<ForecastReport>(payload.clone()) {
        Ok(report) => print!("{}", report.summary()),
        Err(_) => println!("{}", serde_json::to_string_pretty(&payload)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        assert!(parse_args(None).unwrap().is_empty());
        let args = parse_args(Some(r#"{"city":"Bangkok","days":5}"#)).unwrap();
        assert_eq!(args["city"], "Bangkok");
        assert!(parse_args(Some("[1, 2]")).is_err());
        assert!(parse_args(Some("{oops")).is_err());
    }
}
