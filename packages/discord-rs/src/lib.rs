// https://discord.com/developers/docs/resources/webhook#execute-webhook

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

pub mod models;

pub use models::{Embed, EmbedAuthor, EmbedField, EmbedFooter, WebhookPayload};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Discord returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Client for a single Discord webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    webhook_url: String,
    client: Client,
}

impl WebhookClient {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            webhook_url: webhook_url.into(),
            client,
        })
    }

    /// Execute the webhook with `payload`.
    ///
    /// Discord answers 204 on success; any non-2xx status is surfaced with
    /// its response body.
    pub async fn execute(&self, payload: &WebhookPayload) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::Status { status, body });
        }

        Ok(())
    }
}
