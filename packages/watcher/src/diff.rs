//! Snapshot comparison.

use std::collections::{HashMap, HashSet};

use crate::types::{DiffResult, JobCollection};

/// Classify the jobs of `current` against `previous`.
///
/// Both snapshots must belong to the same source; this function does not
/// check. Presence is decided by job id alone, update by the tracked
/// fields (title, description, location, department). Result ordering
/// follows the input collections: `current`'s order for new and updated,
/// `previous`'s order for removed. `compare(x, x)` yields an empty diff.
pub fn compare(previous: &JobCollection, current: &JobCollection) -> DiffResult {
    let mut result = DiffResult {
        company_name: current.company_name.clone(),
        source_url: current.source_url.clone(),
        new_jobs: Vec::new(),
        updated_jobs: Vec::new(),
        removed_jobs: Vec::new(),
    };

    let previous_by_id: HashMap<&str, &crate::types::Job> = previous
        .jobs
        .iter()
        .map(|job| (job.id.as_str(), job))
        .collect();
    let current_ids: HashSet<&str> = current.jobs.iter().map(|job| job.id.as_str()).collect();

    for job in &current.jobs {
        match previous_by_id.get(job.id.as_str()) {
            None => result.new_jobs.push(job.clone()),
            Some(previous_job) if !job.tracked_fields_eq(previous_job) => {
                result.updated_jobs.push(job.clone());
            }
            Some(_) => {}
        }
    }

    for job in &previous.jobs {
        if !current_ids.contains(job.id.as_str()) {
            result.removed_jobs.push(job.clone());
        }
    }

    result
}
