//! Read-side query surface consumed by the HTTP layer and the CLI.
//!
//! Queries only ever read the cache and detector, never triggering a
//! fetch. A location with no cache entry yet reads as absent, which the
//! HTTP layer turns into 404 rather than an empty-but-successful answer.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strikecast_core::{Domain, Location, ScoredReading};

use crate::cache::ConditionCache;
use crate::strike::StrikeDetector;

/// An open strike event joined with the location's current score.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveStrike {
    #[serde(flatten)]
    pub event: strikecast_core::StrikeEvent,
    pub score: u8,
}

#[derive(Clone)]
pub struct ConditionService {
    locations: Arc<HashMap<String, Location>>,
    cache: Arc<ConditionCache>,
    detector: Arc<StrikeDetector>,
}

impl ConditionService {
    #[must_use]
    pub fn new(
        locations: Vec<Location>,
        cache: Arc<ConditionCache>,
        detector: Arc<StrikeDetector>,
    ) -> Self {
        let locations = locations
            .into_iter()
            .map(|l| (l.id.clone(), l))
            .collect::<HashMap<_, _>>();
        Self {
            locations: Arc::new(locations),
            cache,
            detector,
        }
    }

    #[must_use]
    pub fn location(&self, location_id: &str) -> Option<&Location> {
        self.locations.get(location_id)
    }

    #[must_use]
    pub fn last_cycle_completed_at(&self) -> Option<DateTime<Utc>> {
        self.cache.last_cycle_completed_at()
    }

    /// Current conditions for every refreshed location in a domain.
    #[must_use]
    pub fn current_conditions(&self, domain: Domain) -> BTreeMap<String, ScoredReading> {
        self.locations
            .values()
            .filter(|location| location.domain == domain)
            .filter_map(|location| {
                let entry = self.cache.get(&location.id)?;
                Some((location.id.clone(), (*entry).clone()))
            })
            .collect()
    }

    /// Latest conditions for one location, if it has been refreshed.
    #[must_use]
    pub fn location_conditions(&self, location_id: &str) -> Option<Arc<ScoredReading>> {
        self.cache.get(location_id)
    }

    /// Open strike events in a domain, highest current score first.
    ///
    /// The current score comes from the cache; if a stale-data gap leaves
    /// no entry, the event's recorded peak stands in.
    #[must_use]
    pub fn active_strikes(&self, domain: Domain) -> Vec<ActiveStrike> {
        let mut strikes: Vec<ActiveStrike> = self
            .detector
            .open_events()
            .into_iter()
            .filter(|event| {
                self.locations
                    .get(&event.location_id)
                    .is_some_and(|location| location.domain == domain)
            })
            .map(|event| {
                let score = self
                    .cache
                    .get(&event.location_id)
                    .map_or(event.peak_score, |entry| entry.score);
                ActiveStrike { event, score }
            })
            .collect();

        strikes.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.event.location_id.cmp(&b.event.location_id))
        });
        strikes
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use strikecast_core::{Metric, Reading, SourceId};

    use super::*;

    fn location(id: &str, domain: Domain) -> Location {
        Location {
            id: id.to_string(),
            name: id.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            domain,
            region: "us-west".to_string(),
        }
    }

    fn scored(location_id: &str, score: u8) -> ScoredReading {
        let metrics = [(Metric::WaveHeight, 2.0)].into_iter().collect();
        ScoredReading::new(
            Reading::new(location_id, Utc::now(), SourceId::Ndbc, metrics),
            score,
            70,
        )
    }

    fn service() -> ConditionService {
        let locations = vec![
            location("46042", Domain::Surf),
            location("44065", Domain::Surf),
            location("mammoth", Domain::Ski),
        ];
        let ids = locations.iter().map(|l| l.id.clone());
        let cache = Arc::new(ConditionCache::new(ids.clone()));
        let detector = Arc::new(StrikeDetector::new(ids, 70, chrono::Duration::hours(3)));
        ConditionService::new(locations, cache, detector)
    }

    #[test]
    fn conditions_are_filtered_by_domain() {
        let svc = service();
        svc.cache.put("46042", scored("46042", 80));
        svc.cache.put("mammoth", scored("mammoth", 90));

        let surf = svc.current_conditions(Domain::Surf);
        assert_eq!(surf.len(), 1);
        assert!(surf.contains_key("46042"));

        let ski = svc.current_conditions(Domain::Ski);
        assert_eq!(ski.len(), 1);
        assert!(ski.contains_key("mammoth"));
    }

    #[test]
    fn unrefreshed_location_reads_as_absent() {
        let svc = service();
        assert!(svc.location_conditions("46042").is_none());
        assert!(svc.location_conditions("atlantis").is_none());
        assert!(svc.current_conditions(Domain::Surf).is_empty());
    }

    #[test]
    fn active_strikes_sort_by_current_score_descending() {
        let svc = service();
        let now = Utc::now();

        svc.cache.put("46042", scored("46042", 75));
        svc.detector.observe("46042", 75, now);
        svc.cache.put("44065", scored("44065", 95));
        svc.detector.observe("44065", 95, now);

        let strikes = svc.active_strikes(Domain::Surf);
        assert_eq!(strikes.len(), 2);
        assert_eq!(strikes[0].event.location_id, "44065");
        assert_eq!(strikes[0].score, 95);
        assert_eq!(strikes[1].event.location_id, "46042");
    }

    #[test]
    fn active_strikes_exclude_other_domains() {
        let svc = service();
        let now = Utc::now();
        svc.detector.observe("mammoth", 90, now);

        assert!(svc.active_strikes(Domain::Surf).is_empty());
        assert_eq!(svc.active_strikes(Domain::Ski).len(), 1);
    }

    #[test]
    fn closed_strikes_disappear_from_active_list() {
        let svc = service();
        let now = Utc::now();
        svc.detector.observe("46042", 85, now);
        assert_eq!(svc.active_strikes(Domain::Surf).len(), 1);

        svc.detector.observe("46042", 10, now);
        assert!(svc.active_strikes(Domain::Surf).is_empty());
    }
}
