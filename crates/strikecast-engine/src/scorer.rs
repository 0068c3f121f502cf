//! Pure quality scoring over normalized readings.
//!
//! Each metric contributes the points of the first band its value falls in;
//! contributions are summed and clamped to `[0, 100]`. Band bounds are
//! written in the units the domain is discussed in (feet, mph, inches, °F)
//! and a per-metric conversion maps the canonical internal value into band
//! units, the single place those constants live.
//!
//! Recalibrating a region means swapping the band table, never forking the
//! scoring code.

use strikecast_core::{Domain, Metric, Reading};

const M_TO_FT: f64 = 3.280_84;
const MPS_TO_MPH: f64 = 2.236_936;
const CM_TO_IN: f64 = 0.393_701;

/// One scoring band: closed interval in band units, `None` = unbounded.
///
/// Bands are evaluated in order and only the first match contributes, so a
/// boundary value shared by two adjacent bands belongs to the earlier one.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub lo: Option<f64>,
    pub hi: Option<f64>,
    pub points: i32,
}

impl Band {
    const fn new(lo: Option<f64>, hi: Option<f64>, points: i32) -> Self {
        Self { lo, hi, points }
    }

    fn contains(&self, value: f64) -> bool {
        self.lo.map_or(true, |lo| value >= lo) && self.hi.map_or(true, |hi| value <= hi)
    }
}

/// Band set for one metric plus the conversion from canonical units.
pub struct MetricBands {
    pub metric: Metric,
    pub convert: fn(f64) -> f64,
    pub bands: &'static [Band],
}

fn identity(v: f64) -> f64 {
    v
}

fn meters_to_feet(v: f64) -> f64 {
    v * M_TO_FT
}

fn mps_to_mph(v: f64) -> f64 {
    v * MPS_TO_MPH
}

fn cm_to_inches(v: f64) -> f64 {
    v * CM_TO_IN
}

fn celsius_to_fahrenheit(v: f64) -> f64 {
    v * 1.8 + 32.0
}

/// Surf scoring table. Band values are feet, seconds, and mph.
pub const SURF_BANDS: &[MetricBands] = &[
    MetricBands {
        metric: Metric::WaveHeight,
        convert: meters_to_feet,
        bands: &[
            Band::new(Some(4.0), Some(10.0), 40),
            Band::new(Some(10.0), Some(15.0), 30),
            Band::new(Some(2.0), Some(4.0), 25),
        ],
    },
    MetricBands {
        metric: Metric::DominantPeriod,
        convert: identity,
        bands: &[
            Band::new(Some(12.0), None, 30),
            Band::new(Some(10.0), Some(12.0), 20),
            Band::new(Some(8.0), Some(10.0), 10),
        ],
    },
    MetricBands {
        metric: Metric::WindSpeed,
        convert: mps_to_mph,
        bands: &[
            Band::new(Some(15.0), None, -10),
            Band::new(Some(10.0), Some(15.0), 10),
            Band::new(None, Some(10.0), 20),
        ],
    },
    MetricBands {
        metric: Metric::AveragePeriod,
        convert: identity,
        bands: &[Band::new(Some(8.0), None, 10)],
    },
];

/// Ski scoring table. Band values are inches, °F, and mph.
pub const SKI_BANDS: &[MetricBands] = &[
    MetricBands {
        metric: Metric::Snowfall,
        convert: cm_to_inches,
        bands: &[
            Band::new(Some(6.0), Some(18.0), 40),
            Band::new(Some(18.0), Some(30.0), 30),
            Band::new(Some(2.0), Some(6.0), 25),
        ],
    },
    MetricBands {
        metric: Metric::Temperature,
        convert: celsius_to_fahrenheit,
        bands: &[
            Band::new(Some(10.0), Some(30.0), 30),
            Band::new(Some(30.0), Some(34.0), 20),
            Band::new(Some(0.0), Some(10.0), 10),
        ],
    },
    MetricBands {
        metric: Metric::WindSpeed,
        convert: mps_to_mph,
        bands: &[
            Band::new(Some(15.0), None, -10),
            Band::new(Some(10.0), Some(15.0), 10),
            Band::new(None, Some(10.0), 20),
        ],
    },
    MetricBands {
        metric: Metric::BaseDepth,
        convert: cm_to_inches,
        bands: &[Band::new(Some(40.0), None, 10)],
    },
];

/// Score a reading against its domain's band table.
#[must_use]
pub fn score(domain: Domain, reading: &Reading) -> u8 {
    let table = match domain {
        Domain::Surf => SURF_BANDS,
        Domain::Ski => SKI_BANDS,
    };
    score_with_table(table, reading)
}

/// Score a reading against an explicit band table.
///
/// Missing metrics contribute nothing; non-finite values are ignored.
#[must_use]
pub fn score_with_table(table: &[MetricBands], reading: &Reading) -> u8 {
    let mut total: i32 = 0;

    for metric_bands in table {
        let Some(raw) = reading.metric(metric_bands.metric) else {
            continue;
        };
        if !raw.is_finite() {
            continue;
        }
        let value = (metric_bands.convert)(raw);
        if let Some(band) = metric_bands.bands.iter().find(|b| b.contains(value)) {
            total += band.points;
        }
    }

    // Clamped to [0, 100] above, so the narrowing conversion cannot fail.
    u8::try_from(total.clamp(0, 100)).unwrap_or(u8::MAX)
}
