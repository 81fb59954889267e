//! Weather provider client
//!
//! The tool host talks to the provider through [`ForecastProvider`];
//! [`OpenMeteoClient`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, TransportError};
use crate::weather::types::{DailyColumns, ForecastResponse, GeoLocation, GeocodingResponse};

/// Daily variables requested from the forecast endpoint
const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum";

/// Geocoding and forecast lookups used by `get_forecast`
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Resolve a city name to its best match, if any
    async fn geocode(&self, city: &str) -> Result<Option<GeoLocation>>;

    /// Fetch the daily forecast columns for a coordinate
    async fn daily_forecast(&self, latitude: f64, longitude: f64) -> Result<DailyColumns>;
}

/// Open-Meteo API client
pub struct OpenMeteoClient {
    /// HTTP client
    http_client: reqwest::Client,

    geocoding_url: String,

    forecast_url: String,

    /// Applied to every request
    timeout: Duration,
}

impl OpenMeteoClient {
    /// Create a new client from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
            timeout: config.provider_timeout,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await?;
            Err(TransportError::Upstream {
                status: status.as_u16(),
                body,
            }
            .into())
        }
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    async fn geocode(&self, city: &str) -> Result<Option<GeoLocation>> {
        debug!(city, "Geocoding city");
        let response: GeocodingResponse = self
            .get_json(
                &self.geocoding_url,
                &[
                    ("name", city.to_string()),
                    ("count", "1".to_string()),
                    ("language", "en".to_string()),
                ],
            )
            .await?;

        Ok(response.results.and_then(|results| results.into_iter().next()))
    }

    async fn daily_forecast(&self, latitude: f64, longitude: f64) -> Result<DailyColumns> {
        debug!(latitude, longitude, "Fetching daily forecast");
        let response: ForecastResponse = self
            .get_json(
                &self.forecast_url,
                &[
                    ("latitude", latitude.to_string()),
                    ("longitude", longitude.to_string()),
                    ("daily", DAILY_VARIABLES.to_string()),
                    ("timezone", "auto".to_string()),
                ],
            )
            .await?;

        Ok(response.daily)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocoding_response_without_results() {
        let response: GeocodingResponse = serde_json::from_str(r#"{"generationtime_ms":0.5}"#).unwrap();
        assert!(response.results.is_none());
    }

    #[test]
    fn test_geocoding_response_first_match() {
        let response: GeocodingResponse = serde_json::from_str(
            r#"{"results":[{"name":"Bangkok","latitude":13.75,"longitude":100.5,"country":"Thailand"}]}"#,
        )
        .unwrap();
        let top = response.results.unwrap().remove(0);
        assert_eq!(top.label(), "Bangkok, Thailand");
    }

    #[test]
    fn test_forecast_response_with_nulls() {
        let response: ForecastResponse = serde_json::from_str(
            r#"{"daily":{"time":["2026-10-14"],"temperature_2m_max":[null],"precipitation_sum":[1.2]}}"#,
        )
        .unwrap();
        assert_eq!(response.daily.time.len(), 1);
        assert_eq!(response.daily.temperature_2m_max, vec![None]);
        assert!(response.daily.temperature_2m_min.is_empty());
    }

    #[test]
    fn test_client_uses_configured_endpoints() {
        let config = Config {
            geocoding_url: "http://geo.test/search".to_string(),
            ..Config::default()
        };
        let client = OpenMeteoClient::new(&config);
        assert_eq!(client.geocoding_url, "http://geo.test/search");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }
}
