//! Weather provider type definitions
//!
//! These types mirror the Open-Meteo geocoding and forecast responses, plus
//! the per-day records returned by the `get_forecast` tool.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// Geocoding search response
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GeocodingResponse {
    /// Matches, best first. Absent when nothing matched.
    #[serde(default)]
    pub results: Option<Vec<GeoLocation>>,
}

/// A resolved place
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub name: String,

    pub latitude: f64,

    pub longitude: f64,

    #[serde(default)]
    pub country: Option<String>,
}

impl GeoLocation {
    /// Display label, `"<name>, <country>"`
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country.as_deref().unwrap_or(""))
    }
}

/// Forecast response
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ForecastResponse {
    #[serde(default)]
    pub daily: DailyColumns,
}

/// Columnar daily arrays as returned by the provider
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DailyColumns {
    #[serde(default)]
    pub time: Vec<String>,

    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,

    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,

    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
}

/// One forecast day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyForecast {
    pub date: String,

    /// Max temperature, °C
    pub t_max: Option<f64>,

    /// Min temperature, °C
    pub t_min: Option<f64>,

    /// Precipitation sum, mm
    pub precip_mm: Option<f64>,
}

/// `get_forecast` result payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastReport {
    pub city: String,

    pub lat: f64,

    pub lon: f64,

    /// Number of records in `daily`
    pub days: usize,

    pub daily: Vec<DailyForecast>,
}

impl ForecastReport {
    /// Multi-line human-readable rendering, one line per day
    pub fn summary(&self) -> String {
        let mut out = format!("City: {}\nDays: {}\n", self.city, self.days);
        for day in &self.daily {
            let _ = writeln!(
                out,
                "  - {}: max {} °C, min {} °C, precipitation {} mm",
                day.date,
                reading(day.t_max),
                reading(day.t_min),
                reading(day.precip_mm),
            );
        }
        out
    }
}

fn reading(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}
