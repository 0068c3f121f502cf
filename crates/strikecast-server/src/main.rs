mod api;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use strikecast_engine::{EngineSettings, JsonlSink, RefreshEngine};
use strikecast_sources::SourceRegistry;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = strikecast_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let locations = strikecast_core::load_locations(&config.locations_path)?;
    tracing::info!(
        locations = locations.locations.len(),
        "loaded reference location set"
    );

    let registry = SourceRegistry::from_config(&config)?;
    let sink = Arc::new(JsonlSink::open(&config.events_path)?);
    let engine = Arc::new(RefreshEngine::new(
        locations.locations,
        registry,
        sink,
        EngineSettings::from_app_config(&config),
    ));
    let service = engine.service();

    // Warm the cache in the background so the first scheduled tick isn't the
    // first time anyone sees data.
    {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if let Ok(report) = engine.run_cycle().await {
                tracing::info!(
                    refreshed = report.refreshed,
                    failed = report.failed,
                    "initial refresh cycle finished"
                );
            }
        });
    }

    let _scheduler = scheduler::build_scheduler(engine, config.refresh_interval_secs).await?;

    let app = build_app(AppState { service });
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "serving condition API");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
