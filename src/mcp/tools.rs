//! MCP tool definitions and handlers
//!
//! Defines the static tool catalog and dispatches `callTool` requests.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::error::{Result, ToolError, ValidationError};
use crate::mcp::schema::{InputSchema, PropertySchema, SchemaType};
use crate::mcp::types::ToolDescriptor;
use crate::weather::client::ForecastProvider;
use crate::weather::forecast::{clamp_days, project_daily, MAX_DAYS, MIN_DAYS};
use crate::weather::types::ForecastReport;

/// Name of the forecast tool
pub const GET_FORECAST: &str = "get_forecast";

/// Tool handler
pub struct ToolHandler {
    provider: Arc<dyn ForecastProvider>,
    catalog: Vec<ToolDescriptor>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(provider: Arc<dyn ForecastProvider>) -> Self {
        Self {
            provider,
            catalog: vec![ToolDescriptor {
                name: GET_FORECAST.to_string(),
                description: "Get simple daily weather forecast by city name".to_string(),
                input_schema: get_forecast_schema(),
            }],
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    /// Call a tool by name.
    ///
    /// Arguments are validated against the tool's schema before any
    /// external call is made.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self
            .catalog
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_string(),
            })?;

        tool.input_schema.validate(&args)?;

        match name {
            GET_FORECAST => self.handle_get_forecast(&args).await,
            _ => Err(ToolError::UnknownTool {
                name: name.to_string(),
            }
            .into()),
        }
    }

    // ==================== Tool Handlers ====================

    async fn handle_get_forecast(&self, args: &Value) -> Result<Value> {
        let city = args
            .get("city")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if city.is_empty() {
            return Err(ValidationError::MissingField {
                field: "city".to_string(),
            }
            .into());
        }
        let days = clamp_days(args.get("days").and_then(Value::as_i64));

        let location = self
            .provider
            .geocode(city)
            .await?
            .ok_or_else(|| ToolError::NotFound {
                message: format!("City '{}' not found", city),
            })?;

        let columns = self
            .provider
            .daily_forecast(location.latitude, location.longitude)
            .await?;
        let daily = project_daily(&columns, days);

        info!(city = %location.label(), days = daily.len(), "Forecast resolved");

        let report = ForecastReport {
            city: location.label(),
            lat: location.latitude,
            lon: location.longitude,
            days: daily.len(),
            daily,
        };
        Ok(serde_json::to_value(report)?)
    }
}

// ==================== Tool Schemas ====================

fn get_forecast_schema() -> InputSchema {
    InputSchema::object()
        .property(
            "city",
            PropertySchema::new(SchemaType::String).describe("City name, e.g. Bangkok"),
        )
        .property(
            "days",
            PropertySchema::new(SchemaType::Integer)
                .describe("Number of forecast days")
                .range(MIN_DAYS, MAX_DAYS),
        )
        .require("city")
}
