//! Integration tests for the watch pipeline orchestration.
//!
//! All collaborators are in-process mocks; no network involved.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use watcher::{
    DiffResult, Job, JobCollection, JobRepository, JobScraper, MemoryRepository, Notifier,
    SourceError, WatcherService,
};

fn job(id: &str, title: &str) -> Job {
    Job {
        id: id.to_string(),
        title: title.to_string(),
        description: "desc".to_string(),
        location: "Remote".to_string(),
        department: "Engineering".to_string(),
        url: format!("https://acme.example/jobs/{id}"),
        posted_at: None,
        observed_at: Utc::now(),
    }
}

fn collection(url: &str, jobs: Vec<Job>) -> JobCollection {
    JobCollection {
        company_name: "Acme".to_string(),
        source_url: url.to_string(),
        observed_at: Utc::now(),
        jobs,
    }
}

// ---------------------------------------------------------------------------
// Mock collaborators with call tracking
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockScraper {
    pages: HashMap<String, Vec<Job>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockScraper {
    fn with_page(mut self, url: &str, jobs: Vec<Job>) -> Self {
        self.pages.insert(url.to_string(), jobs);
        self
    }

    fn with_failure(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobScraper for MockScraper {
    async fn scrape(&self, url: &str) -> Result<JobCollection> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(anyhow!("connection reset by peer"));
        }
        let jobs = self.pages.get(url).cloned().unwrap_or_default();
        Ok(collection(url, jobs))
    }
}

#[derive(Default)]
struct MockNotifier {
    fail: bool,
    delivered: Mutex<Vec<DiffResult>>,
}

impl MockNotifier {
    fn failing() -> Self {
        Self { fail: true, delivered: Mutex::new(Vec::new()) }
    }

    fn delivered(&self) -> Vec<DiffResult> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, diff: &DiffResult) -> Result<()> {
        if !diff.has_changes() {
            return Ok(());
        }
        self.delivered.lock().unwrap().push(diff.clone());
        if self.fail {
            return Err(anyhow!("webhook returned 500"));
        }
        Ok(())
    }
}

/// Wraps the real in-memory store with switchable failures and a save log.
#[derive(Default)]
struct FlakyRepository {
    inner: MemoryRepository,
    fail_lookup: bool,
    fail_save: bool,
    saves: Mutex<Vec<String>>,
}

impl FlakyRepository {
    fn failing_lookup() -> Self {
        Self { fail_lookup: true, ..Self::default() }
    }

    fn failing_save() -> Self {
        Self { fail_save: true, ..Self::default() }
    }

    fn saves(&self) -> Vec<String> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobRepository for FlakyRepository {
    async fn save(&self, collection: JobCollection) -> Result<()> {
        if self.fail_save {
            return Err(anyhow!("store rejected write"));
        }
        self.saves.lock().unwrap().push(collection.source_url.clone());
        self.inner.save(collection).await
    }

    async fn latest(&self, url: &str) -> Result<Option<JobCollection>> {
        if self.fail_lookup {
            return Err(anyhow!("store unavailable"));
        }
        self.inner.latest(url).await
    }
}

fn service(
    scraper: Arc<dyn JobScraper>,
    notifier: Arc<dyn Notifier>,
    repository: Arc<dyn JobRepository>,
    sources: &[&str],
) -> WatcherService {
    WatcherService::new(
        scraper,
        notifier,
        repository,
        sources.iter().map(|s| s.to_string()).collect(),
    )
}

const URL: &str = "https://acme.example/careers";

// ---------------------------------------------------------------------------
// Pipeline behavior
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_observation_saves_without_notifying() {
    let scraper = Arc::new(MockScraper::default().with_page(URL, vec![job("1", "Engineer")]));
    let notifier = Arc::new(MockNotifier::default());
    let repository = Arc::new(MemoryRepository::new());
    let svc = service(scraper, notifier.clone(), repository.clone(), &[URL]);

    let summary = svc.run_once(&CancellationToken::new()).await;

    assert_eq!(summary.processed, 1);
    assert!(summary.failures.is_empty());
    assert!(notifier.delivered().is_empty());
    assert!(repository.latest(URL).await.unwrap().is_some());
}

#[tokio::test]
async fn unchanged_snapshot_sends_no_notification() {
    let scraper = Arc::new(MockScraper::default().with_page(URL, vec![job("1", "Engineer")]));
    let notifier = Arc::new(MockNotifier::default());
    let repository = Arc::new(MemoryRepository::new());
    let svc = service(scraper, notifier.clone(), repository, &[URL]);

    svc.run_once(&CancellationToken::new()).await;
    let summary = svc.run_once(&CancellationToken::new()).await;

    assert_eq!(summary.processed, 1);
    assert!(notifier.delivered().is_empty());
}

#[tokio::test]
async fn changed_snapshot_notifies_and_persists() {
    let notifier = Arc::new(MockNotifier::default());
    let repository = Arc::new(MemoryRepository::new());

    // Baseline pass: one engineer.
    let baseline = Arc::new(MockScraper::default().with_page(URL, vec![job("1", "Engineer")]));
    service(baseline, notifier.clone(), repository.clone(), &[URL])
        .run_once(&CancellationToken::new())
        .await;

    // Next pass: the engineer was retitled and a designer appeared.
    let changed = Arc::new(
        MockScraper::default()
            .with_page(URL, vec![job("1", "Senior Engineer"), job("2", "Designer")]),
    );
    let svc = service(changed, notifier.clone(), repository.clone(), &[URL]);
    let summary = svc.run_once(&CancellationToken::new()).await;

    assert_eq!(summary.processed, 1);
    let delivered = notifier.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].updated_jobs.len(), 1);
    assert_eq!(delivered[0].updated_jobs[0].title, "Senior Engineer");
    assert_eq!(delivered[0].new_jobs.len(), 1);
    assert_eq!(delivered[0].new_jobs[0].id, "2");
    assert!(delivered[0].removed_jobs.is_empty());

    // Snapshot advanced: re-running the same pass reports nothing further.
    svc.run_once(&CancellationToken::new()).await;
    assert_eq!(notifier.delivered().len(), 1);
}

#[tokio::test]
async fn removed_job_is_reported_exactly_once() {
    let notifier = Arc::new(MockNotifier::default());
    let repository = Arc::new(MemoryRepository::new());

    let baseline =
        Arc::new(MockScraper::default().with_page(URL, vec![job("1", "Engineer"), job("2", "Designer")]));
    service(baseline, notifier.clone(), repository.clone(), &[URL])
        .run_once(&CancellationToken::new())
        .await;

    let shrunk = Arc::new(MockScraper::default().with_page(URL, vec![job("1", "Engineer")]));
    service(shrunk, notifier.clone(), repository, &[URL])
        .run_once(&CancellationToken::new())
        .await;

    let delivered = notifier.delivered();
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].new_jobs.is_empty());
    assert!(delivered[0].updated_jobs.is_empty());
    assert_eq!(delivered[0].removed_jobs.len(), 1);
    assert_eq!(delivered[0].removed_jobs[0].id, "2");
}

#[tokio::test]
async fn notify_failure_still_persists_snapshot() {
    let notifier = Arc::new(MockNotifier::failing());
    let repository = Arc::new(MemoryRepository::new());

    let baseline = Arc::new(MockScraper::default().with_page(URL, vec![job("1", "Engineer")]));
    service(baseline, notifier.clone(), repository.clone(), &[URL])
        .run_once(&CancellationToken::new())
        .await;

    let changed =
        Arc::new(MockScraper::default().with_page(URL, vec![job("1", "Principal Engineer")]));
    let svc = service(changed, notifier.clone(), repository.clone(), &[URL]);
    let summary = svc.run_once(&CancellationToken::new()).await;

    assert_eq!(summary.failures.len(), 1);
    assert!(matches!(summary.failures[0], SourceError::Delivery { .. }));

    // The snapshot advanced despite the delivery failure, so the same diff
    // is not re-detected on the next pass.
    let stored = repository.latest(URL).await.unwrap().unwrap();
    assert_eq!(stored.jobs[0].title, "Principal Engineer");

    svc.run_once(&CancellationToken::new()).await;
    assert_eq!(notifier.delivered().len(), 1);
}

#[tokio::test]
async fn scrape_failure_is_isolated_per_source() {
    let url_a = "https://a.example/careers";
    let url_b = "https://b.example/careers";
    let scraper = Arc::new(
        MockScraper::default()
            .with_failure(url_a)
            .with_page(url_b, vec![job("1", "Engineer")]),
    );
    let notifier = Arc::new(MockNotifier::default());
    let repository = Arc::new(MemoryRepository::new());
    let svc = service(scraper.clone(), notifier, repository.clone(), &[url_a, url_b]);

    let summary = svc.run_once(&CancellationToken::new()).await;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failures.len(), 1);
    assert!(matches!(&summary.failures[0], SourceError::Fetch { url, .. } if url == url_a));

    // Both sources were attempted, and the healthy one went through the
    // full pipeline.
    assert_eq!(scraper.calls(), vec![url_a.to_string(), url_b.to_string()]);
    assert!(repository.latest(url_a).await.unwrap().is_none());
    assert!(repository.latest(url_b).await.unwrap().is_some());
}

#[tokio::test]
async fn lookup_failure_saves_baseline_without_notifying() {
    let scraper = Arc::new(MockScraper::default().with_page(URL, vec![job("1", "Engineer")]));
    let notifier = Arc::new(MockNotifier::default());
    let repository = Arc::new(FlakyRepository::failing_lookup());
    let svc = service(scraper, notifier.clone(), repository.clone(), &[URL]);

    let summary = svc.run_once(&CancellationToken::new()).await;

    assert_eq!(summary.failures.len(), 1);
    assert!(matches!(summary.failures[0], SourceError::Lookup { .. }));
    assert!(notifier.delivered().is_empty());
    assert_eq!(repository.saves(), vec![URL.to_string()]);
}

#[tokio::test]
async fn persist_failure_is_reported_and_batch_continues() {
    let url_a = "https://a.example/careers";
    let url_b = "https://b.example/careers";
    let scraper = Arc::new(
        MockScraper::default()
            .with_page(url_a, vec![job("1", "Engineer")])
            .with_page(url_b, vec![job("2", "Designer")]),
    );
    let notifier = Arc::new(MockNotifier::default());
    let repository = Arc::new(FlakyRepository::failing_save());
    let svc = service(scraper, notifier, repository, &[url_a, url_b]);

    let summary = svc.run_once(&CancellationToken::new()).await;

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.failures.len(), 2);
    assert!(summary
        .failures
        .iter()
        .all(|f| matches!(f, SourceError::Persist { .. })));
}

// ---------------------------------------------------------------------------
// Overlap and cancellation
// ---------------------------------------------------------------------------

/// Scraper that parks until released, to hold a source in flight.
struct BlockingScraper {
    started: Arc<tokio::sync::Notify>,
    release: Arc<tokio::sync::Notify>,
}

#[async_trait]
impl JobScraper for BlockingScraper {
    async fn scrape(&self, url: &str) -> Result<JobCollection> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(collection(url, vec![]))
    }
}

#[tokio::test]
async fn overlapping_pass_skips_in_flight_source() {
    let started = Arc::new(tokio::sync::Notify::new());
    let release = Arc::new(tokio::sync::Notify::new());
    let scraper = Arc::new(BlockingScraper {
        started: started.clone(),
        release: release.clone(),
    });
    let svc = Arc::new(service(
        scraper,
        Arc::new(MockNotifier::default()),
        Arc::new(MemoryRepository::new()),
        &[URL],
    ));

    let first = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.run_once(&CancellationToken::new()).await })
    };
    started.notified().await;

    // The first pass is parked inside scrape; a second tick must skip the
    // source rather than queue behind it.
    let second = svc.run_once(&CancellationToken::new()).await;
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 1);

    release.notify_one();
    let first = first.await.unwrap();
    assert_eq!(first.processed, 1);
    assert_eq!(first.skipped, 0);

    // The claim was released; a later pass processes the source again.
    let third = {
        let svc = svc.clone();
        let handle = tokio::spawn(async move { svc.run_once(&CancellationToken::new()).await });
        started.notified().await;
        release.notify_one();
        handle.await.unwrap()
    };
    assert_eq!(third.processed, 1);
}

/// Scraper whose fetch never completes.
struct HangingScraper;

#[async_trait]
impl JobScraper for HangingScraper {
    async fn scrape(&self, _url: &str) -> Result<JobCollection> {
        futures::future::pending::<()>().await;
        unreachable!()
    }
}

#[tokio::test]
async fn cancellation_aborts_in_flight_source_cleanly() {
    let notifier = Arc::new(MockNotifier::default());
    let repository = Arc::new(FlakyRepository::default());
    let svc = service(Arc::new(HangingScraper), notifier.clone(), repository.clone(), &[URL]);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = svc.run_once(&cancel).await;

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.failures.len(), 1);
    assert!(matches!(summary.failures[0], SourceError::Fetch { .. }));
    // No partial state: nothing was saved, nothing notified.
    assert!(repository.saves().is_empty());
    assert!(notifier.delivered().is_empty());
}
