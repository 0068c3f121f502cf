//! Keyed current/forecast JSON API (global).
//!
//! Global fallback for ski locations. Uses the 3-hourly forecast endpoint
//! with `units=metric` and an `appid` query parameter; without a configured
//! key the adapter is disabled and the resolver skips it. Snowfall for the
//! next 24 h is accumulated over the first eight 3-hour slots; a forecast
//! with no snow blocks reports 0 cm (no snow expected is a valid reading,
//! not a parse failure).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use strikecast_core::{Location, Metric, Reading, SourceId};

use crate::error::SourceError;
use crate::fetch::fetch_json;

const SOURCE: SourceId = SourceId::OpenWeather;

/// Eight 3-hour slots cover the 24 h accumulation window.
const FORECAST_SLOTS_24H: usize = 8;

pub struct OpenWeatherAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherAdapter {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch the 24 h snow outlook and current atmosphere for a location.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Disabled`] — no API key configured.
    /// - [`SourceError::Unavailable`] — transport failure or non-2xx status.
    /// - [`SourceError::RateLimited`] — provider returned HTTP 429.
    /// - [`SourceError::MalformedPayload`] — response shape violated.
    pub async fn fetch(&self, location: &Location) -> Result<Reading, SourceError> {
        let Some(api_key) = &self.api_key else {
            return Err(SourceError::Disabled { source_id: SOURCE });
        };

        let url = format!(
            "{}/data/2.5/forecast?lat={}&lon={}&units=metric&appid={api_key}",
            self.base_url, location.latitude, location.longitude
        );
        let payload = fetch_json(&self.client, &url, SOURCE).await?;
        parse_forecast_payload(&payload, &location.id)
    }
}

fn parse_forecast_payload(
    payload: &serde_json::Value,
    location_id: &str,
) -> Result<Reading, SourceError> {
    let list = payload
        .get("list")
        .and_then(serde_json::Value::as_array)
        .filter(|entries| !entries.is_empty())
        .ok_or_else(|| SourceError::MalformedPayload {
            source_id: SOURCE,
            reason: "forecast list is missing or empty".to_string(),
        })?;

    let first = &list[0];

    let observed_at = first
        .get("dt")
        .and_then(serde_json::Value::as_i64)
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    let snowfall_mm: f64 = list
        .iter()
        .take(FORECAST_SLOTS_24H)
        .filter_map(|entry| entry.pointer("/snow/3h").and_then(serde_json::Value::as_f64))
        .sum();

    let mut metrics = BTreeMap::new();
    metrics.insert(Metric::Snowfall, snowfall_mm / 10.0);

    if let Some(temp_c) = first.pointer("/main/temp").and_then(serde_json::Value::as_f64) {
        metrics.insert(Metric::Temperature, temp_c);
    }
    if let Some(wind_mps) = first
        .pointer("/wind/speed")
        .and_then(serde_json::Value::as_f64)
    {
        metrics.insert(Metric::WindSpeed, wind_mps);
    }

    Ok(Reading::new(location_id, observed_at, SOURCE, metrics))
}
