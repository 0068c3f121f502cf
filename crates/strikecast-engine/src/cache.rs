//! Point-in-time condition cache.
//!
//! The key set is fixed at construction (the location set is immutable
//! reference data), so every key owns its own lock; readers of one
//! location never contend with a writer of another, and a `put` is an
//! atomic pointer swap. Stale entries are retained across failed cycles:
//! last-known-good beats fresh-but-absent.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use strikecast_core::ScoredReading;

pub struct ConditionCache {
    entries: HashMap<String, RwLock<Option<Arc<ScoredReading>>>>,
    last_cycle_completed_at: RwLock<Option<DateTime<Utc>>>,
}

impl ConditionCache {
    /// Build a cache over a fixed set of location ids.
    #[must_use]
    pub fn new(location_ids: impl IntoIterator<Item = String>) -> Self {
        let entries = location_ids
            .into_iter()
            .map(|id| (id, RwLock::new(None)))
            .collect();
        Self {
            entries,
            last_cycle_completed_at: RwLock::new(None),
        }
    }

    /// Latest successful reading for a location, if any.
    ///
    /// Unknown ids and never-refreshed locations both read as absent.
    #[must_use]
    pub fn get(&self, location_id: &str) -> Option<Arc<ScoredReading>> {
        let slot = self.entries.get(location_id)?;
        slot.read().ok()?.clone()
    }

    /// Snapshot of every populated entry.
    #[must_use]
    pub fn get_all(&self) -> BTreeMap<String, Arc<ScoredReading>> {
        self.entries
            .iter()
            .filter_map(|(id, slot)| {
                let entry = slot.read().ok()?.clone()?;
                Some((id.clone(), entry))
            })
            .collect()
    }

    /// Replace a location's entry wholesale.
    ///
    /// Writes to ids outside the fixed key set are dropped (and logged);
    /// the reference set is the source of truth for what exists.
    pub fn put(&self, location_id: &str, scored: ScoredReading) {
        let Some(slot) = self.entries.get(location_id) else {
            tracing::warn!(location = %location_id, "cache put for unknown location; dropping");
            return;
        };
        if let Ok(mut guard) = slot.write() {
            *guard = Some(Arc::new(scored));
        }
    }

    #[must_use]
    pub fn last_cycle_completed_at(&self) -> Option<DateTime<Utc>> {
        self.last_cycle_completed_at.read().ok().and_then(|g| *g)
    }

    pub fn mark_cycle_completed(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.last_cycle_completed_at.write() {
            *guard = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap as MetricMap;

    use chrono::Utc;
    use strikecast_core::{Metric, Reading, SourceId};

    use super::*;

    fn scored(location_id: &str, score: u8, wave_m: f64) -> ScoredReading {
        let metrics: MetricMap<Metric, f64> = [(Metric::WaveHeight, wave_m)].into_iter().collect();
        ScoredReading::new(
            Reading::new(location_id, Utc::now(), SourceId::Ndbc, metrics),
            score,
            70,
        )
    }

    fn cache_for(ids: &[&str]) -> ConditionCache {
        ConditionCache::new(ids.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn absent_until_first_put() {
        let cache = cache_for(&["46042"]);
        assert!(cache.get("46042").is_none());
        assert!(cache.get_all().is_empty());
        assert!(cache.last_cycle_completed_at().is_none());
    }

    #[test]
    fn put_replaces_entry_wholesale() {
        let cache = cache_for(&["46042"]);
        cache.put("46042", scored("46042", 40, 1.0));
        cache.put("46042", scored("46042", 85, 2.5));

        let entry = cache.get("46042").unwrap();
        // The new value is fully consistent: score and metrics moved together.
        assert_eq!(entry.score, 85);
        assert_eq!(entry.reading.metric(Metric::WaveHeight), Some(2.5));
    }

    #[test]
    fn readers_keep_the_value_they_grabbed() {
        let cache = cache_for(&["46042"]);
        cache.put("46042", scored("46042", 40, 1.0));

        let before = cache.get("46042").unwrap();
        cache.put("46042", scored("46042", 85, 2.5));

        // The earlier snapshot is unchanged; fresh reads see the new value.
        assert_eq!(before.score, 40);
        assert_eq!(before.reading.metric(Metric::WaveHeight), Some(1.0));
        assert_eq!(cache.get("46042").unwrap().score, 85);
    }

    #[test]
    fn unknown_location_put_is_dropped() {
        let cache = cache_for(&["46042"]);
        cache.put("nope", scored("nope", 50, 1.0));
        assert!(cache.get("nope").is_none());
        assert_eq!(cache.get_all().len(), 0);
    }

    #[test]
    fn get_all_returns_only_populated_entries() {
        let cache = cache_for(&["46042", "46026", "44065"]);
        cache.put("46042", scored("46042", 40, 1.0));
        cache.put("44065", scored("44065", 90, 2.0));

        let all = cache.get_all();
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("46042"));
        assert!(all.contains_key("44065"));
        assert!(!all.contains_key("46026"));
    }

    #[test]
    fn cycle_completion_timestamp_is_recorded() {
        let cache = cache_for(&["46042"]);
        let now = Utc::now();
        cache.mark_cycle_completed(now);
        assert_eq!(cache.last_cycle_completed_at(), Some(now));
    }
}
