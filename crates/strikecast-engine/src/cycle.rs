//! Refresh cycle driver.
//!
//! One cycle walks the full location set: resolve through the fallback
//! chain, score, publish to the cache, feed the strike detector. Locations
//! run concurrently up to a configured bound; a per-location failure is
//! logged and the batch continues. Cycles never overlap; a second caller
//! gets `AlreadyRunning` instead of doubling upstream load mid-flight.
//!
//! The driver is directly invocable without any timer, which is how both
//! the CLI and the tests use it; the server wires it to a repeating job.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use strikecast_core::{AppConfig, Location, ScoredReading};
use strikecast_sources::SourceRegistry;
use thiserror::Error;

use crate::cache::ConditionCache;
use crate::scorer;
use crate::sink::StrikeSink;
use crate::strike::{StrikeDetector, StrikeTransition};

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("a refresh cycle is already running")]
    AlreadyRunning,
}

/// How a finished cycle went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every location refreshed successfully.
    Completed,
    /// At least one location produced no reading this cycle.
    PartiallyFailed,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
    pub refreshed: usize,
    pub failed: usize,
    pub strikes_opened: usize,
    pub strikes_closed: usize,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub max_concurrent_locations: usize,
    pub cycle_deadline: std::time::Duration,
    pub strike_threshold: u8,
    pub strike_silence: chrono::Duration,
}

impl EngineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let silence_secs = i64::try_from(config.strike_silence_secs).unwrap_or(i64::MAX);
        Self {
            max_concurrent_locations: config.max_concurrent_locations,
            cycle_deadline: std::time::Duration::from_secs(config.cycle_deadline_secs),
            strike_threshold: config.strike_threshold,
            strike_silence: chrono::Duration::seconds(silence_secs),
        }
    }
}

struct LocationOutcome {
    succeeded: bool,
    opened: bool,
    closed: bool,
}

pub struct RefreshEngine {
    locations: Vec<Location>,
    registry: SourceRegistry,
    cache: Arc<ConditionCache>,
    detector: Arc<StrikeDetector>,
    sink: Arc<dyn StrikeSink>,
    settings: EngineSettings,
    running: AtomicBool,
}

impl RefreshEngine {
    #[must_use]
    pub fn new(
        locations: Vec<Location>,
        registry: SourceRegistry,
        sink: Arc<dyn StrikeSink>,
        settings: EngineSettings,
    ) -> Self {
        let ids = || locations.iter().map(|l| l.id.clone());
        let cache = Arc::new(ConditionCache::new(ids()));
        let detector = Arc::new(StrikeDetector::new(
            ids(),
            settings.strike_threshold,
            settings.strike_silence,
        ));
        Self {
            locations,
            registry,
            cache,
            detector,
            sink,
            settings,
            running: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Read-side view over the cache and detector for query consumers.
    #[must_use]
    pub fn service(&self) -> crate::query::ConditionService {
        crate::query::ConditionService::new(
            self.locations.clone(),
            Arc::clone(&self.cache),
            Arc::clone(&self.detector),
        )
    }

    /// Run one full refresh pass over the location set.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::AlreadyRunning`] if another cycle is in flight.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let _guard = CycleGuard::acquire(&self.running)?;

        let cycle_at = Utc::now();
        let started = Instant::now();
        tracing::info!(locations = self.locations.len(), "refresh cycle starting");

        let deadline = tokio::time::sleep(self.settings.cycle_deadline);
        let outcomes: Vec<LocationOutcome> = stream::iter(0..self.locations.len())
            .map(|index| self.refresh_location(&self.locations[index], cycle_at))
            .buffer_unordered(self.settings.max_concurrent_locations.max(1))
            .take_until(deadline)
            .collect()
            .await;

        // Locations cut off by the deadline are failures for this cycle;
        // they get retried naturally on the next one.
        let timed_out = self.locations.len() - outcomes.len();
        if timed_out > 0 {
            tracing::warn!(
                timed_out,
                deadline_secs = self.settings.cycle_deadline.as_secs(),
                "cycle deadline reached before all locations finished"
            );
        }

        let refreshed = outcomes.iter().filter(|o| o.succeeded).count();
        let failed = outcomes.len() - refreshed + timed_out;
        let strikes_opened = outcomes.iter().filter(|o| o.opened).count();
        let mut strikes_closed = outcomes.iter().filter(|o| o.closed).count();

        for event in self.detector.sweep_silent(cycle_at) {
            if let Err(error) = self.sink.record_closed_event(&event) {
                tracing::error!(
                    location = %event.location_id,
                    error = %error,
                    "failed to persist force-closed strike event"
                );
            }
            strikes_closed += 1;
        }

        self.cache.mark_cycle_completed(cycle_at);

        let outcome = if failed == 0 {
            CycleOutcome::Completed
        } else {
            CycleOutcome::PartiallyFailed
        };

        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            refreshed,
            failed,
            strikes_opened,
            strikes_closed,
            elapsed_ms,
            "refresh cycle finished"
        );

        Ok(CycleReport {
            cycle_at,
            outcome,
            refreshed,
            failed,
            strikes_opened,
            strikes_closed,
        })
    }

    async fn refresh_location(
        &self,
        location: &Location,
        cycle_at: DateTime<Utc>,
    ) -> LocationOutcome {
        let reading = match self.registry.resolve(location).await {
            Ok(reading) => reading,
            Err(error) => {
                // Stale-but-present semantics: the cache entry is untouched
                // and the detector keeps its state for this location.
                tracing::warn!(
                    location = %location.id,
                    error = %error,
                    "no source available; keeping last known conditions"
                );
                return LocationOutcome {
                    succeeded: false,
                    opened: false,
                    closed: false,
                };
            }
        };

        let score = scorer::score(location.domain, &reading);
        let source = reading.source;
        let scored = ScoredReading::new(reading, score, self.settings.strike_threshold);

        if let Err(error) = self.sink.record_snapshot(&scored) {
            tracing::warn!(location = %location.id, error = %error, "failed to persist snapshot");
        }
        self.cache.put(&location.id, scored);

        let mut opened = false;
        let mut closed = false;
        match self.detector.observe(&location.id, score, cycle_at) {
            StrikeTransition::Opened(event) => {
                tracing::info!(location = %location.id, score, event = %event.id, "strike onset");
                opened = true;
            }
            StrikeTransition::Closed(event) => {
                tracing::info!(
                    location = %location.id,
                    score,
                    peak = event.peak_score,
                    "strike resolved"
                );
                if let Err(error) = self.sink.record_closed_event(&event) {
                    tracing::error!(
                        location = %location.id,
                        error = %error,
                        "failed to persist closed strike event"
                    );
                }
                closed = true;
            }
            StrikeTransition::PeakUpdated { peak_score } => {
                tracing::debug!(location = %location.id, peak_score, "strike peak updated");
            }
            StrikeTransition::Unchanged => {}
        }

        tracing::debug!(location = %location.id, score, source = %source, "location refreshed");
        LocationOutcome {
            succeeded: true,
            opened,
            closed,
        }
    }
}

/// Non-overlap guard: flips the `running` flag for the cycle's lifetime.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CycleError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CycleError::AlreadyRunning)?;
        Ok(Self { flag })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
