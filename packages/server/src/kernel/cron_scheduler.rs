//! Cron scheduler adapter over tokio-cron-scheduler.
//!
//! Ticks fire independently: a tick does not wait for the previous
//! invocation of the same job to finish. Overlap control is the job's
//! responsibility (the watcher service skips sources that are still in
//! flight). A job's error is logged here and never escalated; the
//! scheduler keeps ticking.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use watcher::{ScheduledJob, Scheduler};

pub struct CronScheduler {
    inner: JobScheduler,
    cancel: CancellationToken,
}

impl CronScheduler {
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self {
            inner,
            cancel: CancellationToken::new(),
        })
    }

    /// Root token for this scheduler; cancelled when [`Scheduler::stop`]
    /// runs. Tick tokens are children of it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[async_trait]
impl Scheduler for CronScheduler {
    async fn schedule(&self, spec: &str, job: ScheduledJob) -> Result<()> {
        let cancel = self.cancel.clone();
        let cron_job = Job::new_async(spec, move |_uuid, _lock| {
            let job = job.clone();
            let cancel = cancel.child_token();
            Box::pin(async move {
                if let Err(e) = job(cancel).await {
                    error!(error = %e, "Scheduled job failed");
                }
            })
        })
        .with_context(|| format!("Invalid cron spec {spec:?}"))?;

        self.inner
            .add(cron_job)
            .await
            .context("Failed to register cron job")?;
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        // Cancel in-flight passes first so they wind down while the
        // scheduler shuts its ticking loop.
        self.cancel.cancel();
        let mut inner = self.inner.clone();
        inner
            .shutdown()
            .await
            .context("Failed to shut down scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}
