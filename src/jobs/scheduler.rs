use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::CronConfig;
use crate::error::{AppError, AppResult};
use crate::services::PublishingService;

/// In-process cron trigger that runs the tick on `cron.expression`.
///
/// A firing that finds the previous tick still running is skipped; ticks are
/// safe to overlap, but stacking them inside one process buys nothing.
pub struct TickScheduler {
    scheduler: Arc<Mutex<JobScheduler>>,
    publishing: PublishingService,
    config: CronConfig,
    running: Arc<Mutex<()>>,
}

impl TickScheduler {
    pub async fn new(publishing: PublishingService, config: CronConfig) -> AppResult<Self> {
        let scheduler = JobScheduler::new().await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            publishing,
            config,
            running: Arc::new(Mutex::new(())),
        })
    }

    /// Registers the tick job and starts the scheduler
    pub async fn start(&self) -> AppResult<()> {
        let job = self.tick_job()?;
        let scheduler = self.scheduler.lock().await;
        scheduler.add(job).await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;
        scheduler.start().await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

        tracing::info!(
            expression = %self.config.expression,
            tick_limit = self.config.tick_limit,
            "Cron tick scheduler started"
        );
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        tracing::info!("Cron tick scheduler stopped");
        Ok(())
    }

    fn tick_job(&self) -> AppResult<Job> {
        let publishing = self.publishing.clone();
        let running = Arc::clone(&self.running);
        let limit = self.config.tick_limit;

        Job::new_async(self.config.expression.as_str(), move |_uuid, _lock| {
            let publishing = publishing.clone();
            let running = Arc::clone(&running);

            Box::pin(async move {
                let Ok(_guard) = running.try_lock() else {
                    tracing::warn!("Previous tick still running, skipping this firing");
                    return;
                };
                match publishing.tick(Some(limit)).await {
                    Ok(report) => tracing::info!(
                        found = report.found,
                        processed = report.processed,
                        failed = report.failed,
                        "Scheduled tick completed"
                    ),
                    Err(e) => tracing::error!(error = %e, "Scheduled tick failed"),
                }
            })
        })
        .map_err(|e| AppError::BadRequest {
            message: format!("Invalid cron expression: {}", e),
        })
    }
}
