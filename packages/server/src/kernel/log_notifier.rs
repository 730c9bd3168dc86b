//! Notifier that writes change alerts to the process log.
//!
//! For dry runs and local development (`NOTIFIER=log`).

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use watcher::{DiffResult, Notification, Notifier};

#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, diff: &DiffResult) -> Result<()> {
        for notification in Notification::from_diff(diff) {
            info!(
                kind = ?notification.kind,
                company = %notification.company_name,
                source = %notification.source_url,
                jobs = notification.payload.len(),
                "{}",
                notification.message
            );
        }
        Ok(())
    }
}
