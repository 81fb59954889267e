//! Weather data module
//!
//! Contains provider types, the Open-Meteo client and the daily forecast projection.

pub mod client;
pub mod forecast;
pub mod types;
