//! Normalized condition readings.
//!
//! All metric values are stored in a single canonical unit system; source
//! adapters convert from provider-native units at ingestion so nothing
//! downstream ever needs to know where a value came from.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which upstream adapter produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Ndbc,
    Nws,
    OpenMeteo,
    OpenWeather,
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceId::Ndbc => write!(f, "ndbc"),
            SourceId::Nws => write!(f, "nws"),
            SourceId::OpenMeteo => write!(f, "openmeteo"),
            SourceId::OpenWeather => write!(f, "openweather"),
        }
    }
}

/// Named metric with a fixed canonical internal unit.
///
/// Wave height in meters, periods in seconds, wind in m/s, temperature in
/// degrees Celsius, snow depths in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "wave_height_m")]
    WaveHeight,
    #[serde(rename = "dominant_period_s")]
    DominantPeriod,
    #[serde(rename = "average_period_s")]
    AveragePeriod,
    #[serde(rename = "wind_speed_mps")]
    WindSpeed,
    #[serde(rename = "temperature_c")]
    Temperature,
    #[serde(rename = "snowfall_cm")]
    Snowfall,
    #[serde(rename = "base_depth_cm")]
    BaseDepth,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Metric::WaveHeight => "wave_height_m",
            Metric::DominantPeriod => "dominant_period_s",
            Metric::AveragePeriod => "average_period_s",
            Metric::WindSpeed => "wind_speed_mps",
            Metric::Temperature => "temperature_c",
            Metric::Snowfall => "snowfall_cm",
            Metric::BaseDepth => "base_depth_cm",
        };
        write!(f, "{name}")
    }
}

/// One normalized observation for one location at one time.
///
/// Immutable once constructed; replaced wholesale on the next refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub location_id: String,
    pub observed_at: DateTime<Utc>,
    pub source: SourceId,
    pub metrics: BTreeMap<Metric, f64>,
}

impl Reading {
    #[must_use]
    pub fn new(
        location_id: impl Into<String>,
        observed_at: DateTime<Utc>,
        source: SourceId,
        metrics: BTreeMap<Metric, f64>,
    ) -> Self {
        Self {
            location_id: location_id.into(),
            observed_at,
            source,
            metrics,
        }
    }

    #[must_use]
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }
}

/// A reading plus its quality score, produced fresh each refresh cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredReading {
    pub reading: Reading,
    pub score: u8,
    pub is_strike: bool,
}

impl ScoredReading {
    #[must_use]
    pub fn new(reading: Reading, score: u8, threshold: u8) -> Self {
        Self {
            reading,
            score,
            is_strike: score >= threshold,
        }
    }
}
