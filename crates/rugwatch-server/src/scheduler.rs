//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at daemon startup and registers the
//! recurring mention-poll and trusted-list refresh jobs.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use rugwatch_trust::TrustedAccountCache;

use crate::monitor::Monitor;

/// Mention poll cadence: every five minutes.
const MENTION_POLL_SCHEDULE: &str = "0 */5 * * * *";

/// Daily trusted-list refresh at 03:15 UTC, off the poll cadence.
const TRUSTED_REFRESH_SCHEDULE: &str = "0 15 3 * * *";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    monitor: Arc<Monitor>,
    cache: Arc<TrustedAccountCache>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_monitor_job(&scheduler, monitor).await?;
    register_trusted_refresh_job(&scheduler, cache).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the five-minute mention poll.
///
/// Each firing runs one full monitoring cycle; failures inside the cycle are
/// logged per event and never propagate out of the job body.
async fn register_monitor_job(
    scheduler: &JobScheduler,
    monitor: Arc<Monitor>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(MENTION_POLL_SCHEDULE, move |_uuid, _lock| {
        let monitor = Arc::clone(&monitor);

        Box::pin(async move {
            monitor.run_cycle().await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Register the daily trusted-list refresh.
///
/// The poll path refreshes lazily on TTL expiry anyway; this job keeps the
/// set warm so the lazy path rarely has to block on the network.
async fn register_trusted_refresh_job(
    scheduler: &JobScheduler,
    cache: Arc<TrustedAccountCache>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(TRUSTED_REFRESH_SCHEDULE, move |_uuid, _lock| {
        let cache = Arc::clone(&cache);

        Box::pin(async move {
            tracing::info!("scheduler: starting daily trusted-list refresh");
            match cache.refresh().await {
                Ok(count) => {
                    tracing::info!(count, "scheduler: trusted-list refresh complete");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "scheduler: trusted-list refresh failed; keeping previous set");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
