//! Daily forecast projection
//!
//! Turns the provider's columnar arrays into per-day records.

use crate::weather::types::{DailyColumns, DailyForecast};

/// Fewest forecast days a caller may request
pub const MIN_DAYS: i64 = 1;

/// Most forecast days a caller may request
pub const MAX_DAYS: i64 = 7;

/// Days used when the caller leaves `days` out
pub const DEFAULT_DAYS: i64 = 3;

/// Resolve a requested day count to the number of records to return.
///
/// Absent or zero falls back to [`DEFAULT_DAYS`]; everything else is clamped
/// to `[MIN_DAYS, MAX_DAYS]`. This is the only place the count is defaulted.
pub fn clamp_days(requested: Option<i64>) -> usize {
    let days = match requested {
        None | Some(0) => DEFAULT_DAYS,
        Some(n) => n,
    };
    days.clamp(MIN_DAYS, MAX_DAYS) as usize
}

/// Project columnar daily arrays into at most `days` records.
///
/// Rows follow `time`; a missing cell in any other column becomes `None`.
pub fn project_daily(columns: &DailyColumns, days: usize) -> Vec<DailyForecast> {
    let cell = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();

    columns
        .time
        .iter()
        .take(days)
        .enumerate()
        .map(|(i, date)| DailyForecast {
            date: date.clone(),
            t_max: cell(&columns.temperature_2m_max, i),
            t_min: cell(&columns.temperature_2m_min, i),
            precip_mm: cell(&columns.precipitation_sum, i),
        })
        .collect()
}
