//! Durable strike-event records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contiguous interval during which a location's score stayed at or above
/// the strike threshold.
///
/// `ended_at` is `None` while the event is ongoing. The detector guarantees
/// at most one open event per location at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrikeEvent {
    pub id: Uuid,
    pub location_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub peak_score: u8,
    pub peak_at: DateTime<Utc>,
}

impl StrikeEvent {
    /// Open a new event at `now` with `score` as the initial peak.
    #[must_use]
    pub fn open(location_id: impl Into<String>, score: u8, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            location_id: location_id.into(),
            started_at: now,
            ended_at: None,
            peak_score: score,
            peak_at: now,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_event_has_no_end_and_score_as_peak() {
        let now = Utc::now();
        let event = StrikeEvent::open("46042", 85, now);
        assert!(event.is_open());
        assert_eq!(event.peak_score, 85);
        assert_eq!(event.started_at, now);
        assert_eq!(event.peak_at, now);
    }
}
