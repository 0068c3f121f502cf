//! Fixed-width buoy observation feed.
//!
//! NDBC realtime2 station files are whitespace-aligned text: the first line
//! is a header row of column tokens, the second a units row, and the first
//! data row is the latest observation. Columns are matched to metrics by
//! header token position; `MM` marks a missing value.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use strikecast_core::{Location, Metric, Reading, SourceId};

use crate::error::SourceError;
use crate::fetch::fetch_text;

const SOURCE: SourceId = SourceId::Ndbc;

/// Header token → metric mapping for the columns the scorer consumes.
/// All of these are already reported in canonical units (m, s, m/s).
const COLUMNS: &[(&str, Metric)] = &[
    ("WVHT", Metric::WaveHeight),
    ("DPD", Metric::DominantPeriod),
    ("APD", Metric::AveragePeriod),
    ("WSPD", Metric::WindSpeed),
];

pub struct NdbcAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl NdbcAdapter {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the latest observation for a buoy location.
    ///
    /// The location id doubles as the station id.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Unavailable`] — transport failure or non-2xx status.
    /// - [`SourceError::MalformedPayload`] — feed shape violated, or the
    ///   wave-height column is absent or unparseable.
    pub async fn fetch(&self, location: &Location) -> Result<Reading, SourceError> {
        let url = format!(
            "{}/data/realtime2/{}.txt",
            self.base_url,
            location.id.to_uppercase()
        );
        let body = fetch_text(&self.client, &url, SOURCE).await?;
        parse_realtime2(&body, &location.id)
    }
}

/// Parse a realtime2 station file into a normalized reading.
fn parse_realtime2(body: &str, location_id: &str) -> Result<Reading, SourceError> {
    let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());

    let header_line = lines
        .next()
        .ok_or_else(|| malformed("feed is empty"))?;
    if !header_line.starts_with('#') {
        return Err(malformed("first line is not a header row"));
    }
    let header: Vec<&str> = header_line
        .trim_start_matches('#')
        .split_whitespace()
        .collect();

    // Some feeds carry a units row after the header; both start with '#'.
    let data_line = lines
        .find(|l| !l.starts_with('#'))
        .ok_or_else(|| malformed("no observation rows"))?;
    let fields: Vec<&str> = data_line.split_whitespace().collect();

    let observed_at = parse_timestamp(&fields)?;

    let mut metrics = BTreeMap::new();
    for (token, metric) in COLUMNS {
        let Some(index) = header.iter().position(|h| h == token) else {
            continue;
        };
        if let Some(value) = parse_field(&fields, index) {
            metrics.insert(*metric, value);
        }
    }

    // The wave magnitude is the minimum required metric for a usable
    // marine reading; everything else degrades to a neutral contribution.
    if !metrics.contains_key(&Metric::WaveHeight) {
        return Err(malformed("wave height column missing or unparseable"));
    }

    Ok(Reading::new(location_id, observed_at, SOURCE, metrics))
}

/// First five columns are YY MM DD hh mm (UTC, four-digit year).
fn parse_timestamp(fields: &[&str]) -> Result<chrono::DateTime<Utc>, SourceError> {
    if fields.len() < 5 {
        return Err(malformed("observation row too short for a timestamp"));
    }
    let mut parts = [0u32; 5];
    for (slot, field) in parts.iter_mut().zip(fields.iter().take(5)) {
        *slot = field
            .parse::<u32>()
            .map_err(|_| malformed("observation timestamp is unparseable"))?;
    }

    let year =
        i32::try_from(parts[0]).map_err(|_| malformed("observation year out of range"))?;
    Utc.with_ymd_and_hms(year, parts[1], parts[2], parts[3], parts[4], 0)
        .single()
        .ok_or_else(|| malformed("observation timestamp is not a valid date"))
}

/// `MM` and unparseable numbers are treated as missing, not fatal.
fn parse_field(fields: &[&str], index: usize) -> Option<f64> {
    let raw = fields.get(index)?;
    if *raw == "MM" {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn malformed(reason: &str) -> SourceError {
    SourceError::MalformedPayload {
        source_id: SOURCE,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "\
#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE
#yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT   hPa  degC  degC  degC  nmi  hPa    ft
2026 08 06 19 40 300  2.0  4.0   2.0  14.0  10.0 290 1015.2  15.0  14.0  12.0 99.0 +0.0 99.00
2026 08 06 18 40 310  3.5  5.0   1.8  13.0   9.5 285 1015.8  15.2  14.1  12.2 99.0 +0.0 99.00
";

    #[test]
    fn parses_latest_observation_after_units_row() {
        let reading = parse_realtime2(FEED, "46042").unwrap();
        assert_eq!(reading.location_id, "46042");
        assert_eq!(reading.source, SourceId::Ndbc);
        assert_eq!(reading.metric(Metric::WaveHeight), Some(2.0));
        assert_eq!(reading.metric(Metric::DominantPeriod), Some(14.0));
        assert_eq!(reading.metric(Metric::AveragePeriod), Some(10.0));
        assert_eq!(reading.metric(Metric::WindSpeed), Some(2.0));
        assert_eq!(
            reading.observed_at,
            Utc.with_ymd_and_hms(2026, 8, 6, 19, 40, 0).unwrap()
        );
    }

    #[test]
    fn missing_markers_become_absent_metrics() {
        let feed = "\
#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD
#yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT
2026 08 06 19 40 300  MM   4.0   1.5    MM  10.0 290
";
        let reading = parse_realtime2(feed, "46042").unwrap();
        assert_eq!(reading.metric(Metric::WaveHeight), Some(1.5));
        assert_eq!(reading.metric(Metric::WindSpeed), None);
        assert_eq!(reading.metric(Metric::DominantPeriod), None);
        assert_eq!(reading.metric(Metric::AveragePeriod), Some(10.0));
    }

    #[test]
    fn missing_wave_height_value_is_malformed() {
        let feed = "\
#YY  MM DD hh mm WVHT  DPD
#yr  mo dy hr mn    m  sec
2026 08 06 19 40   MM  14.0
";
        let err = parse_realtime2(feed, "46042").unwrap_err();
        assert!(
            matches!(err, SourceError::MalformedPayload { .. }),
            "expected MalformedPayload, got: {err:?}"
        );
    }

    #[test]
    fn header_without_wave_column_is_malformed() {
        let feed = "\
#YY  MM DD hh mm WDIR WSPD
#yr  mo dy hr mn degT m/s
2026 08 06 19 40 300  5.0
";
        let err = parse_realtime2(feed, "46042").unwrap_err();
        assert!(matches!(err, SourceError::MalformedPayload { .. }));
    }

    #[test]
    fn empty_body_is_malformed() {
        let err = parse_realtime2("", "46042").unwrap_err();
        assert!(matches!(err, SourceError::MalformedPayload { .. }));
    }

    #[test]
    fn body_without_data_rows_is_malformed() {
        let feed = "#YY MM DD hh mm WVHT\n#yr mo dy hr mn m\n";
        let err = parse_realtime2(feed, "46042").unwrap_err();
        assert!(matches!(err, SourceError::MalformedPayload { .. }));
    }

    #[test]
    fn garbage_timestamp_is_malformed() {
        let feed = "\
#YY  MM DD hh mm WVHT
#yr  mo dy hr mn    m
20XX 08 06 19 40  2.0
";
        let err = parse_realtime2(feed, "46042").unwrap_err();
        assert!(matches!(err, SourceError::MalformedPayload { .. }));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let feed = "\n\n#YY MM DD hh mm WVHT DPD\n\n#yr mo dy hr mn m sec\n\n2026 08 06 19 40 1.2 9.0\n";
        let reading = parse_realtime2(feed, "44065").unwrap();
        assert_eq!(reading.metric(Metric::WaveHeight), Some(1.2));
    }
}
