//! One-shot refresh: run a single cycle and print the results.
//!
//! Ops/manual shim around the engine. A partially failed cycle is reported
//! but is not an error exit; per-location failures are routine.

use std::sync::Arc;

use strikecast_core::Domain;
use strikecast_engine::{CycleOutcome, EngineSettings, JsonlSink, RefreshEngine};
use strikecast_sources::SourceRegistry;

pub async fn run(domain_filter: Option<Domain>) -> anyhow::Result<()> {
    let config = strikecast_core::load_app_config()?;
    let locations = strikecast_core::load_locations(&config.locations_path)?;

    let registry = SourceRegistry::from_config(&config)?;
    let sink = Arc::new(JsonlSink::open(&config.events_path)?);
    let engine = RefreshEngine::new(
        locations.locations,
        registry,
        sink,
        EngineSettings::from_app_config(&config),
    );

    let report = engine.run_cycle().await?;
    let service = engine.service();

    let as_of = report.cycle_at.format("%Y-%m-%d %H:%M UTC");
    println!("conditions as of {as_of}");
    println!("{:<32} {:<6} {:>5}  {}", "LOCATION", "DOMAIN", "SCORE", "STRIKE");

    for location in engine.locations() {
        if domain_filter.is_some_and(|d| d != location.domain) {
            continue;
        }
        match service.location_conditions(&location.id) {
            Some(entry) => {
                let strike = if entry.is_strike { "yes" } else { "" };
                println!(
                    "{:<32} {:<6} {:>5}  {}",
                    location.name, location.domain, entry.score, strike
                );
            }
            None => {
                println!("{:<32} {:<6} {:>5}", location.name, location.domain, "--");
            }
        }
    }

    println!();
    let domains: Vec<Domain> = match domain_filter {
        Some(domain) => vec![domain],
        None => vec![Domain::Surf, Domain::Ski],
    };
    for domain in domains {
        let strikes = service.active_strikes(domain);
        if strikes.is_empty() {
            println!("no active {domain} strikes");
            continue;
        }
        println!("active {domain} strikes:");
        for strike in strikes {
            let since = strike.event.started_at.format("%Y-%m-%d %H:%M UTC");
            println!(
                "  {:<28} score {:>3}  peak {:>3}  since {since}",
                strike.event.location_id, strike.score, strike.event.peak_score
            );
        }
    }

    println!();
    match report.outcome {
        CycleOutcome::Completed => {
            println!("cycle complete: {} locations refreshed", report.refreshed);
        }
        CycleOutcome::PartiallyFailed => {
            println!(
                "cycle partially failed: {} refreshed, {} failed",
                report.refreshed, report.failed
            );
        }
    }

    Ok(())
}
