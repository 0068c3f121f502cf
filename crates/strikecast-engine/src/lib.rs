//! Condition-aggregation and strike-detection engine.
//!
//! Orchestrates one refresh cycle at a time over the reference location set:
//! resolve each location through its fallback chain, score the normalized
//! reading, publish it to the condition cache, and feed the strike detector.
//! Read queries only ever touch the cache and never trigger a fetch.

mod cache;
mod cycle;
mod query;
mod scorer;
mod sink;
mod strike;

pub use cache::ConditionCache;
pub use cycle::{CycleError, CycleOutcome, CycleReport, EngineSettings, RefreshEngine};
pub use query::{ActiveStrike, ConditionService};
pub use scorer::{score, score_with_table, Band, MetricBands, SKI_BANDS, SURF_BANDS};
pub use sink::{JsonlSink, MemorySink, SinkError, StrikeSink};
pub use strike::{StrikeDetector, StrikeTransition};
