//! Strike lifecycle state machine.
//!
//! Tracks, per location, whether the score currently sits at or above the
//! strike threshold and records onset/peak/resolution transitions as durable
//! events. The one structural invariant: at most one open event per location
//! at any time. State lives behind per-key locks over a fixed key set, so
//! concurrent observations for different locations never serialize on a
//! shared lock.
//!
//! Absence of data is not evidence of resolution: a location that produced
//! no reading this cycle keeps its state. The silence sweep bounds that:
//! an active event whose location has been quiet for longer than the
//! configured window is force-closed rather than left open forever behind a
//! dead source.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use strikecast_core::StrikeEvent;

/// Result of feeding one score into the state machine.
#[derive(Debug)]
pub enum StrikeTransition {
    /// Crossed the threshold from below (or from unknown); a new event opened.
    Opened(StrikeEvent),
    /// Still at/above threshold with a new peak recorded.
    PeakUpdated { peak_score: u8 },
    /// No state change.
    Unchanged,
    /// Dropped below the threshold; the event closed.
    Closed(StrikeEvent),
}

#[derive(Default)]
struct LocationState {
    open: Option<StrikeEvent>,
    last_scored_at: Option<DateTime<Utc>>,
}

pub struct StrikeDetector {
    threshold: u8,
    silence_limit: Duration,
    states: HashMap<String, Mutex<LocationState>>,
}

impl StrikeDetector {
    /// Build a detector over a fixed set of location ids.
    #[must_use]
    pub fn new(
        location_ids: impl IntoIterator<Item = String>,
        threshold: u8,
        silence_limit: Duration,
    ) -> Self {
        let states = location_ids
            .into_iter()
            .map(|id| (id, Mutex::new(LocationState::default())))
            .collect();
        Self {
            threshold,
            silence_limit,
            states,
        }
    }

    /// Feed one successful score into the machine.
    ///
    /// Called once per location per refresh cycle; `now` is the cycle's
    /// timestamp so event intervals line up at cycle granularity.
    pub fn observe(&self, location_id: &str, score: u8, now: DateTime<Utc>) -> StrikeTransition {
        let Some(state) = self.states.get(location_id) else {
            tracing::warn!(location = %location_id, "observation for unknown location; ignoring");
            return StrikeTransition::Unchanged;
        };
        let Ok(mut state) = state.lock() else {
            return StrikeTransition::Unchanged;
        };

        state.last_scored_at = Some(now);

        if score >= self.threshold {
            if let Some(event) = &mut state.open {
                if score > event.peak_score {
                    event.peak_score = score;
                    event.peak_at = now;
                    StrikeTransition::PeakUpdated { peak_score: score }
                } else {
                    StrikeTransition::Unchanged
                }
            } else {
                let event = StrikeEvent::open(location_id, score, now);
                state.open = Some(event.clone());
                StrikeTransition::Opened(event)
            }
        } else if let Some(mut event) = state.open.take() {
            event.ended_at = Some(now);
            StrikeTransition::Closed(event)
        } else {
            StrikeTransition::Unchanged
        }
    }

    /// Force-close active events whose locations have been silent too long.
    ///
    /// A location counts as silent once `now - last_scored_at` strictly
    /// exceeds the silence limit; events closed here carry `now` as their
    /// end. Returns the closed events for persistence.
    pub fn sweep_silent(&self, now: DateTime<Utc>) -> Vec<StrikeEvent> {
        let mut closed = Vec::new();

        for (location_id, state) in &self.states {
            let Ok(mut state) = state.lock() else {
                continue;
            };
            if state.open.is_none() {
                continue;
            }
            let silent_for = state
                .last_scored_at
                .map_or(Duration::MAX, |last| now - last);
            if silent_for > self.silence_limit {
                if let Some(mut event) = state.open.take() {
                    event.ended_at = Some(now);
                    tracing::warn!(
                        location = %location_id,
                        silent_secs = silent_for.num_seconds(),
                        "force-closing strike event after prolonged source silence"
                    );
                    closed.push(event);
                }
            }
        }

        closed
    }

    /// Snapshot of every open event.
    #[must_use]
    pub fn open_events(&self) -> Vec<StrikeEvent> {
        self.states
            .values()
            .filter_map(|state| state.lock().ok()?.open.clone())
            .collect()
    }
}
