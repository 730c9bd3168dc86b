// Port traits for dependency injection.
//
// These are infrastructure seams only - the pipeline logic lives in
// `service` and `diff`. Concrete adapters (HTTP scraper, Discord webhook,
// cron scheduler) are injected at process start.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::types::{DiffResult, JobCollection};

#[async_trait]
pub trait JobScraper: Send + Sync {
    /// Fetch `url` and extract its job listings as a snapshot.
    ///
    /// Implementations must assign every job a non-empty id that is stable
    /// across repeated fetches of an unchanged page; unstable ids make the
    /// whole page reappear as "new" on every pass.
    async fn scrape(&self, url: &str) -> Result<JobCollection>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a change alert for `diff`.
    ///
    /// Must succeed without side effects when the diff has no changes.
    async fn notify(&self, diff: &DiffResult) -> Result<()>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Store `collection` as the latest snapshot for its source URL,
    /// replacing any previous snapshot wholesale.
    async fn save(&self, collection: JobCollection) -> Result<()>;

    /// Latest stored snapshot for `url`.
    ///
    /// `Ok(None)` means the source has never been observed; `Err` is
    /// reserved for storage failures.
    async fn latest(&self, url: &str) -> Result<Option<JobCollection>>;
}

/// A recurring unit of work registered with a [`Scheduler`].
///
/// Each tick receives its own cancellation token, cancelled when the
/// scheduler stops.
pub type ScheduledJob =
    Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<()>> + Send + Sync>;

#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Register `job` to run on the recurring cron `spec` (with seconds).
    ///
    /// The scheduler fires the job on every tick without waiting for
    /// earlier invocations to finish, and logs - never propagates - a
    /// job's error.
    async fn schedule(&self, spec: &str, job: ScheduledJob) -> Result<()>;

    /// Begin firing registered jobs.
    async fn start(&self) -> Result<()>;

    /// Halt firing. No further ticks are dispatched after this returns.
    async fn stop(&self) -> Result<()>;
}
