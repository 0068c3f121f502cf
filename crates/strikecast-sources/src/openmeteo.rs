//! Marine forecast JSON API (global, keyless).
//!
//! Global fallback for surf locations when the buoy feed is down. The
//! provider reports hourly arrays in SI units; the first hour is taken as
//! the current observation. Swell period maps onto the dominant period and
//! wind-wave period onto the average period, which keeps the scorer's inputs
//! aligned with the buoy feed's.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use strikecast_core::{Location, Metric, Reading, SourceId};

use crate::error::SourceError;
use crate::fetch::fetch_json;

const SOURCE: SourceId = SourceId::OpenMeteo;

#[derive(Debug, Deserialize)]
struct MarineResponse {
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(default)]
    wave_height: Vec<Option<f64>>,
    #[serde(default)]
    wave_period: Vec<Option<f64>>,
    #[serde(default)]
    wind_wave_period: Vec<Option<f64>>,
}

pub struct OpenMeteoAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoAdapter {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the current marine conditions for a location.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Unavailable`] — transport failure or non-2xx status.
    /// - [`SourceError::MalformedPayload`] — response shape violated or no
    ///   wave height in the current hour.
    pub async fn fetch(&self, location: &Location) -> Result<Reading, SourceError> {
        let url = format!(
            "{}/v1/marine?latitude={}&longitude={}&hourly=wave_height,wave_period,wind_wave_period&timezone=UTC&forecast_hours=1",
            self.base_url, location.latitude, location.longitude
        );
        let payload = fetch_json(&self.client, &url, SOURCE).await?;
        parse_marine_payload(&payload, &location.id)
    }
}

fn parse_marine_payload(
    payload: &serde_json::Value,
    location_id: &str,
) -> Result<Reading, SourceError> {
    let response: MarineResponse =
        serde_json::from_value(payload.clone()).map_err(|e| SourceError::MalformedPayload {
            source_id: SOURCE,
            reason: format!("unexpected marine response shape: {e}"),
        })?;
    let hourly = &response.hourly;

    let observed_at = hourly
        .time
        .first()
        .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M").ok())
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now);

    let mut metrics = BTreeMap::new();
    if let Some(height) = first_value(&hourly.wave_height) {
        metrics.insert(Metric::WaveHeight, height);
    }
    if let Some(period) = first_value(&hourly.wave_period) {
        metrics.insert(Metric::DominantPeriod, period);
    }
    if let Some(period) = first_value(&hourly.wind_wave_period) {
        metrics.insert(Metric::AveragePeriod, period);
    }

    if !metrics.contains_key(&Metric::WaveHeight) {
        return Err(SourceError::MalformedPayload {
            source_id: SOURCE,
            reason: "no wave height in current hour".to_string(),
        });
    }

    Ok(Reading::new(location_id, observed_at, SOURCE, metrics))
}

fn first_value(series: &[Option<f64>]) -> Option<f64> {
    series.first().copied().flatten().filter(|v| v.is_finite())
}
