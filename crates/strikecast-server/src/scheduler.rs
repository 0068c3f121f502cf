//! Background refresh scheduling.
//!
//! Registers the repeating refresh job at server startup. Failure to build
//! or start the scheduler is fatal: a process that cannot schedule cycles
//! must not come up looking healthy.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use strikecast_engine::{CycleError, RefreshEngine};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down the job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    engine: Arc<RefreshEngine>,
    interval_secs: u64,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_repeated_async(Duration::from_secs(interval_secs), move |_uuid, _lock| {
        let engine = Arc::clone(&engine);

        Box::pin(async move {
            match engine.run_cycle().await {
                Ok(report) => {
                    tracing::info!(
                        outcome = ?report.outcome,
                        refreshed = report.refreshed,
                        failed = report.failed,
                        strikes_opened = report.strikes_opened,
                        strikes_closed = report.strikes_closed,
                        "scheduled refresh cycle finished"
                    );
                }
                Err(CycleError::AlreadyRunning) => {
                    // The previous cycle is still draining; the next tick
                    // will pick up where it left off.
                    tracing::warn!("previous refresh cycle still running; skipping this tick");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(interval_secs, "refresh scheduler started");
    Ok(scheduler)
}
