//! Orchestration of the watch pipeline.
//!
//! One pass walks the configured sources sequentially:
//!
//! ```text
//! run_once
//!     │
//!     └─► for each source URL → process_source
//!             ├─► scraper.scrape        (fetch fresh snapshot)
//!             ├─► repository.latest     (previous snapshot, None on first sight)
//!             ├─► diff::compare         (new / updated / removed)
//!             ├─► notifier.notify       (only when the diff has changes)
//!             └─► repository.save       (always, after a successful scrape)
//! ```
//!
//! A failing source never aborts the batch; its error is logged and
//! collected in the pass summary while the remaining sources run.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::diff::compare;
use crate::error::SourceError;
use crate::traits::{JobRepository, JobScraper, Notifier};

pub struct WatcherService {
    scraper: Arc<dyn JobScraper>,
    notifier: Arc<dyn Notifier>,
    repository: Arc<dyn JobRepository>,
    sources: Vec<String>,
    /// Sources currently being processed. A tick that finds its source
    /// here skips it instead of queueing a second in-flight pass.
    in_flight: Mutex<HashSet<String>>,
}

/// What happened to one source during one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// No prior snapshot existed; saved without notifying.
    FirstObservation { jobs: usize },
    /// Snapshot matched the stored one.
    Unchanged,
    /// Changes detected and (delivery permitting) notified.
    Changed { new: usize, updated: usize, removed: usize },
}

/// Aggregate result of one pass, for logging and tests.
#[derive(Debug, Default)]
pub struct PassSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failures: Vec<SourceError>,
}

impl WatcherService {
    pub fn new(
        scraper: Arc<dyn JobScraper>,
        notifier: Arc<dyn Notifier>,
        repository: Arc<dyn JobRepository>,
        sources: Vec<String>,
    ) -> Self {
        Self {
            scraper,
            notifier,
            repository,
            sources,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Run one full pass over the configured sources.
    ///
    /// Best-effort batch: per-source failures are contained and reported in
    /// the summary, never escalated to the caller.
    pub async fn run_once(&self, cancel: &CancellationToken) -> PassSummary {
        info!(sources = self.sources.len(), "Starting watch pass");

        let mut summary = PassSummary::default();
        for url in &self.sources {
            let Some(_guard) = self.claim(url) else {
                warn!(url = %url, "Previous pass still in flight, skipping this tick");
                summary.skipped += 1;
                continue;
            };

            match self.process_source(cancel, url).await {
                Ok(outcome) => {
                    debug!(url = %url, outcome = ?outcome, "Source processed");
                    summary.processed += 1;
                }
                Err(err) => {
                    error!(url = %url, error = ?err, "Source failed");
                    summary.failures.push(err);
                }
            }
        }

        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failures.len(),
            "Watch pass complete"
        );
        summary
    }

    /// Fetch, diff, notify, and persist one source.
    async fn process_source(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<SourceOutcome, SourceError> {
        let current = tokio::select! {
            result = self.scraper.scrape(url) => {
                result.map_err(|e| SourceError::fetch(url, e))?
            }
            _ = cancel.cancelled() => {
                return Err(SourceError::fetch(url, anyhow!("cancelled while scraping")));
            }
        };
        info!(url = %url, jobs = current.jobs.len(), "Scraped source");

        let previous = match self.repository.latest(url).await {
            Ok(previous) => previous,
            Err(e) => {
                // Storage failure, not first observation: there is nothing
                // trustworthy to diff against. Save the fresh snapshot as the
                // new baseline and report the lookup failure; do not notify.
                self.repository
                    .save(current)
                    .await
                    .map_err(|save_err| SourceError::persist(url, save_err))?;
                return Err(SourceError::lookup(url, e));
            }
        };

        let Some(previous) = previous else {
            let jobs = current.jobs.len();
            self.repository
                .save(current)
                .await
                .map_err(|e| SourceError::persist(url, e))?;
            info!(url = %url, jobs, "First observation, saved without notifying");
            return Ok(SourceOutcome::FirstObservation { jobs });
        };

        let diff = compare(&previous, &current);
        debug!(
            url = %url,
            new = diff.new_jobs.len(),
            updated = diff.updated_jobs.len(),
            removed = diff.removed_jobs.len(),
            "Computed diff"
        );

        let mut delivery_failure = None;
        if diff.has_changes() {
            let delivered = tokio::select! {
                result = self.notifier.notify(&diff) => result,
                _ = cancel.cancelled() => Err(anyhow!("cancelled while delivering notification")),
            };
            if let Err(e) = delivered {
                // The snapshot is still saved below: a notification outage
                // must not make the next pass re-report the same diff.
                warn!(url = %url, error = %e, "Notification delivery failed");
                delivery_failure = Some(e);
            }
        }

        let outcome = if diff.has_changes() {
            SourceOutcome::Changed {
                new: diff.new_jobs.len(),
                updated: diff.updated_jobs.len(),
                removed: diff.removed_jobs.len(),
            }
        } else {
            SourceOutcome::Unchanged
        };

        self.repository
            .save(current)
            .await
            .map_err(|e| SourceError::persist(url, e))?;

        match delivery_failure {
            Some(e) => Err(SourceError::delivery(url, e)),
            None => Ok(outcome),
        }
    }

    /// Mark `url` in flight, or return `None` if an earlier pass still owns
    /// it. The returned guard releases the claim on drop, failures included.
    fn claim<'a>(&'a self, url: &'a str) -> Option<InFlightGuard<'a>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(url.to_string()) {
            return None;
        }
        Some(InFlightGuard { set: &self.in_flight, url })
    }
}

struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    url: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.url);
    }
}
