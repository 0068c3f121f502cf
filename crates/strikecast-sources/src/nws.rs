//! Grid-forecast JSON API (two-step resolution).
//!
//! The provider resolves a coordinate to grid metadata first, then serves
//! the forecast itself from a per-grid resource: `points/{lat},{lon}` yields
//! the `forecastGridData` URL, and the grid payload carries per-metric value
//! series in SI units (snowfall in mm, temperature in degC, wind in km/h).
//! US coverage only; the resolver keeps this adapter out of non-`us-*`
//! chains.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use strikecast_core::{Location, Metric, Reading, SourceId};

use crate::error::SourceError;
use crate::fetch::fetch_json;

const SOURCE: SourceId = SourceId::Nws;

/// Forecast window to accumulate snowfall over.
const SNOWFALL_WINDOW_HOURS: i64 = 24;

pub struct NwsAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl NwsAdapter {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the snow forecast for a location via the two-step grid lookup.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Unavailable`] — transport failure, non-2xx status,
    ///   or a missing expected JSON field in either step.
    /// - [`SourceError::MalformedPayload`] — the grid payload carries no
    ///   usable snowfall values.
    pub async fn fetch(&self, location: &Location) -> Result<Reading, SourceError> {
        let points_url = format!(
            "{}/points/{:.4},{:.4}",
            self.base_url, location.latitude, location.longitude
        );
        let points = fetch_json(&self.client, &points_url, SOURCE).await?;
        let grid_url = extract_grid_url(&points)?;

        let grid = fetch_json(&self.client, &grid_url, SOURCE).await?;
        parse_grid_payload(&grid, &location.id)
    }
}

fn extract_grid_url(points: &serde_json::Value) -> Result<String, SourceError> {
    points
        .pointer("/properties/forecastGridData")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SourceError::Unavailable {
            source_id: SOURCE,
            reason: "points response has no properties.forecastGridData".to_string(),
        })
}

fn parse_grid_payload(grid: &serde_json::Value, location_id: &str) -> Result<Reading, SourceError> {
    let snowfall_values = grid
        .pointer("/properties/snowfallAmount/values")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| SourceError::Unavailable {
            source_id: SOURCE,
            reason: "grid payload has no properties.snowfallAmount.values".to_string(),
        })?;

    let entries: Vec<(DateTime<Utc>, f64)> = snowfall_values
        .iter()
        .filter_map(|entry| {
            let start = entry
                .get("validTime")
                .and_then(serde_json::Value::as_str)
                .and_then(parse_interval_start)?;
            let value = entry.get("value").and_then(serde_json::Value::as_f64)?;
            Some((start, value))
        })
        .collect();

    let Some(&(window_start, _)) = entries.first() else {
        return Err(SourceError::MalformedPayload {
            source_id: SOURCE,
            reason: "snowfall series has no parseable values".to_string(),
        });
    };

    let window_end = window_start + Duration::hours(SNOWFALL_WINDOW_HOURS);
    let snowfall_mm: f64 = entries
        .iter()
        .filter(|(start, _)| *start < window_end)
        .map(|(_, value)| value)
        .sum();

    let mut metrics = BTreeMap::new();
    metrics.insert(Metric::Snowfall, snowfall_mm / 10.0);

    if let Some(temp_c) = first_series_value(grid, "temperature") {
        metrics.insert(Metric::Temperature, temp_c);
    }
    if let Some(wind_kmh) = first_series_value(grid, "windSpeed") {
        metrics.insert(Metric::WindSpeed, wind_kmh / 3.6);
    }

    Ok(Reading::new(location_id, window_start, SOURCE, metrics))
}

/// First value of a grid series, e.g. `properties.temperature.values[0].value`.
fn first_series_value(grid: &serde_json::Value, series: &str) -> Option<f64> {
    grid.pointer(&format!("/properties/{series}/values"))
        .and_then(serde_json::Value::as_array)
        .and_then(|values| values.first())
        .and_then(|entry| entry.get("value"))
        .and_then(serde_json::Value::as_f64)
}

/// Grid timestamps are ISO-8601 intervals, e.g. `2026-01-10T18:00:00+00:00/PT6H`.
fn parse_interval_start(valid_time: &str) -> Option<DateTime<Utc>> {
    let start = valid_time.split('/').next()?;
    DateTime::parse_from_rfc3339(start)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
