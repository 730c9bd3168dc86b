use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One job listing observed on a career page.
///
/// `id` is assigned by the scraper and must be stable across repeated
/// fetches of an unchanged page; the pipeline treats it as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub department: String,
    pub url: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
}

impl Job {
    /// Equality over the fields whose change counts as an update.
    ///
    /// `url`, `posted_at` and `observed_at` are excluded: link rewrites and
    /// timestamp churn alone must not produce notifications.
    pub fn tracked_fields_eq(&self, other: &Job) -> bool {
        self.title == other.title
            && self.description == other.description
            && self.location == other.location
            && self.department == other.department
    }
}

/// Snapshot of every job observed at one source at one point in time.
///
/// The repository keeps at most one snapshot per `source_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCollection {
    pub company_name: String,
    pub source_url: String,
    pub observed_at: DateTime<Utc>,
    pub jobs: Vec<Job>,
}

/// Classification of a current snapshot against the previously stored one.
///
/// The three lists are pairwise disjoint by job id; jobs present in both
/// snapshots with identical tracked fields appear in none of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResult {
    pub company_name: String,
    pub source_url: String,
    pub new_jobs: Vec<Job>,
    pub updated_jobs: Vec<Job>,
    pub removed_jobs: Vec<Job>,
}

impl DiffResult {
    pub fn has_changes(&self) -> bool {
        !self.new_jobs.is_empty() || !self.updated_jobs.is_empty() || !self.removed_jobs.is_empty()
    }
}

/// Content hash for deriving stable job identities.
///
/// Scrapers fall back to this when a page exposes no listing id of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub Vec<u8>);

impl ContentHash {
    pub fn from_content(content: &str) -> Self {
        let normalized = normalize_content(content);
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        Self(hasher.finalize().to_vec())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

/// Collapse whitespace so reflowed markup hashes identically.
fn normalize_content(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}
