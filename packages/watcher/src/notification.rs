//! Change alerts derived from a diff.
//!
//! Notifications are ephemeral: built from a [`DiffResult`], handed to a
//! notifier, then dropped. Nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{DiffResult, Job};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewJobs,
    UpdatedJobs,
    RemovedJobs,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub company_name: String,
    pub source_url: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<Job>,
}

impl Notification {
    /// One notification per non-empty change class, in new/updated/removed
    /// order. Empty for a changeless diff.
    pub fn from_diff(diff: &DiffResult) -> Vec<Notification> {
        let mut notifications = Vec::new();
        if !diff.new_jobs.is_empty() {
            notifications.push(Self::new_jobs(diff));
        }
        if !diff.updated_jobs.is_empty() {
            notifications.push(Self::updated_jobs(diff));
        }
        if !diff.removed_jobs.is_empty() {
            notifications.push(Self::removed_jobs(diff));
        }
        notifications
    }

    pub fn new_jobs(diff: &DiffResult) -> Notification {
        Self::for_jobs(diff, NotificationKind::NewJobs, "New Job Listings", &diff.new_jobs, "new")
    }

    pub fn updated_jobs(diff: &DiffResult) -> Notification {
        Self::for_jobs(
            diff,
            NotificationKind::UpdatedJobs,
            "Updated Job Listings",
            &diff.updated_jobs,
            "updated",
        )
    }

    pub fn removed_jobs(diff: &DiffResult) -> Notification {
        Self::for_jobs(
            diff,
            NotificationKind::RemovedJobs,
            "Removed Job Listings",
            &diff.removed_jobs,
            "removed",
        )
    }

    pub fn error(company_name: &str, source_url: &str, message: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            kind: NotificationKind::Error,
            company_name: company_name.to_string(),
            source_url: source_url.to_string(),
            title: "Scraping Error".to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
            payload: Vec::new(),
        }
    }

    fn for_jobs(
        diff: &DiffResult,
        kind: NotificationKind,
        title: &str,
        jobs: &[Job],
        change: &str,
    ) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            kind,
            company_name: diff.company_name.clone(),
            source_url: diff.source_url.clone(),
            title: title.to_string(),
            message: jobs_message(jobs, change),
            created_at: Utc::now(),
            payload: jobs.to_vec(),
        }
    }
}

fn jobs_message(jobs: &[Job], change: &str) -> String {
    match jobs {
        [] => format!("No {change} jobs found."),
        [job] => format!("1 {change} job: {}", job.title),
        _ => format!("{} {change} jobs found.", jobs.len()),
    }
}
