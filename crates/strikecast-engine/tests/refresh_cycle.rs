//! End-to-end refresh cycle tests.
//!
//! Uses `wiremock` to stand in for every upstream provider. One server
//! serves all adapters on distinct paths, and changing the mounted
//! responses between cycles drives the strike lifecycle.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use strikecast_core::{Domain, Location, Metric};
use strikecast_engine::{
    CycleError, CycleOutcome, EngineSettings, MemorySink, RefreshEngine,
};
use strikecast_sources::{
    NdbcAdapter, NwsAdapter, OpenMeteoAdapter, OpenWeatherAdapter, SourceRegistry,
};

/// Station feed that scores 100: 2.0 m waves, 14 s dominant, 10 s average,
/// 2 m/s wind.
const EPIC_FEED: &str = "\
#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD
#yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT
2026 08 06 19 40 300  2.0  4.0   2.0  14.0  10.0 290
";

/// Station feed that scores 0: flat, short-period, blown out.
const FLAT_FEED: &str = "\
#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD
#yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT
2026 08 06 19 40 300 10.0 12.0   0.5   6.0   5.0 290
";

fn surf_location(id: &str) -> Location {
    Location {
        id: id.to_string(),
        name: format!("Buoy {id}"),
        latitude: 36.785,
        longitude: -122.398,
        domain: Domain::Surf,
        region: "us-west".to_string(),
    }
}

fn settings(silence: chrono::Duration) -> EngineSettings {
    EngineSettings {
        max_concurrent_locations: 4,
        cycle_deadline: Duration::from_secs(30),
        strike_threshold: 70,
        strike_silence: silence,
    }
}

fn engine_against(
    server: &MockServer,
    locations: Vec<Location>,
    sink: Arc<MemorySink>,
    silence: chrono::Duration,
) -> RefreshEngine {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .user_agent("strikecast-test/0.1")
        .build()
        .expect("failed to build test HTTP client");

    let registry = SourceRegistry::new(
        NdbcAdapter::new(client.clone(), server.uri()),
        NwsAdapter::new(client.clone(), server.uri()),
        OpenMeteoAdapter::new(client.clone(), server.uri()),
        OpenWeatherAdapter::new(client, server.uri(), None),
    );

    RefreshEngine::new(locations, registry, sink, settings(silence))
}

async fn mount_station_feed(server: &MockServer, station: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/data/realtime2/{station}.txt")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn cycle_scores_caches_and_opens_strikes() {
    let server = MockServer::start().await;
    mount_station_feed(&server, "46042", EPIC_FEED).await;

    let sink = Arc::new(MemorySink::default());
    let engine = engine_against(
        &server,
        vec![surf_location("46042")],
        Arc::clone(&sink),
        chrono::Duration::hours(3),
    );

    let report = engine.run_cycle().await.unwrap();
    assert_eq!(report.outcome, CycleOutcome::Completed);
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.strikes_opened, 1);

    let service = engine.service();
    let entry = service.location_conditions("46042").unwrap();
    assert_eq!(entry.score, 100);
    assert!(entry.is_strike);
    assert_eq!(entry.reading.metric(Metric::WaveHeight), Some(2.0));
    assert!(service.last_cycle_completed_at().is_some());

    let strikes = service.active_strikes(Domain::Surf);
    assert_eq!(strikes.len(), 1);
    assert_eq!(strikes[0].score, 100);

    // Snapshot persisted; no closed events yet.
    assert_eq!(sink.snapshots().len(), 1);
    assert!(sink.closed_events().is_empty());
}

#[tokio::test]
async fn failed_location_keeps_stale_cache_entry() {
    let server = MockServer::start().await;
    mount_station_feed(&server, "46042", EPIC_FEED).await;
    // "44065" has no mocks mounted at all: both chain sources 404.

    let sink = Arc::new(MemorySink::default());
    let engine = engine_against(
        &server,
        vec![surf_location("46042"), surf_location("44065")],
        Arc::clone(&sink),
        chrono::Duration::hours(3),
    );

    let report = engine.run_cycle().await.unwrap();
    assert_eq!(report.outcome, CycleOutcome::PartiallyFailed);
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.failed, 1);

    let service = engine.service();
    assert!(service.location_conditions("44065").is_none());

    // Second cycle: everything fails, but the first location's last-known
    // reading survives.
    server.reset().await;
    let report = engine.run_cycle().await.unwrap();
    assert_eq!(report.outcome, CycleOutcome::PartiallyFailed);
    assert_eq!(report.refreshed, 0);

    let entry = service.location_conditions("46042").unwrap();
    assert_eq!(entry.score, 100, "stale entry must be retained, not evicted");
}

#[tokio::test]
async fn strike_closes_when_conditions_drop() {
    let server = MockServer::start().await;
    mount_station_feed(&server, "46042", EPIC_FEED).await;

    let sink = Arc::new(MemorySink::default());
    let engine = engine_against(
        &server,
        vec![surf_location("46042")],
        Arc::clone(&sink),
        chrono::Duration::hours(3),
    );

    engine.run_cycle().await.unwrap();
    assert_eq!(engine.service().active_strikes(Domain::Surf).len(), 1);

    server.reset().await;
    mount_station_feed(&server, "46042", FLAT_FEED).await;

    let report = engine.run_cycle().await.unwrap();
    assert_eq!(report.strikes_closed, 1);

    let service = engine.service();
    assert!(service.active_strikes(Domain::Surf).is_empty());
    assert_eq!(service.location_conditions("46042").unwrap().score, 0);

    let closed = sink.closed_events();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].peak_score, 100);
    assert!(closed[0].ended_at.is_some());
}

#[tokio::test]
async fn silent_location_force_closes_after_grace_window() {
    let server = MockServer::start().await;
    mount_station_feed(&server, "46042", EPIC_FEED).await;

    let sink = Arc::new(MemorySink::default());
    // Zero silence window: any cycle without fresh data force-closes.
    let engine = engine_against(
        &server,
        vec![surf_location("46042")],
        Arc::clone(&sink),
        chrono::Duration::zero(),
    );

    engine.run_cycle().await.unwrap();
    assert_eq!(engine.service().active_strikes(Domain::Surf).len(), 1);

    // Source goes permanently dark.
    server.reset().await;
    let report = engine.run_cycle().await.unwrap();
    assert_eq!(report.strikes_closed, 1);
    assert!(engine.service().active_strikes(Domain::Surf).is_empty());

    let closed = sink.closed_events();
    assert_eq!(closed.len(), 1, "dead source must not leave the event open");
    assert!(closed[0].ended_at.is_some());

    // The stale cache entry still reads as a strike-score snapshot; only the
    // event lifecycle is affected by silence.
    assert_eq!(engine.service().location_conditions("46042").unwrap().score, 100);
}

#[tokio::test]
async fn concurrent_cycles_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/realtime2/46042.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(EPIC_FEED)
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let sink = Arc::new(MemorySink::default());
    let engine = Arc::new(engine_against(
        &server,
        vec![surf_location("46042")],
        sink,
        chrono::Duration::hours(3),
    ));

    let background = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.run_cycle().await })
    };

    // Give the background cycle time to take the guard.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = engine.run_cycle().await;
    assert!(
        matches!(second, Err(CycleError::AlreadyRunning)),
        "expected AlreadyRunning, got: {second:?}"
    );

    let first = background.await.unwrap().unwrap();
    assert_eq!(first.outcome, CycleOutcome::Completed);

    // With the first cycle finished, a new one may start.
    assert!(engine.run_cycle().await.is_ok());
}
