//! Discord webhook notifier.
//!
//! Renders a diff as one webhook message: a header line, an embed linking
//! the career page, and one embed per non-empty change class.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use discord::{Embed, WebhookClient, WebhookPayload};
use watcher::{DiffResult, Job, Notifier};

const COLOR_SOURCE: u32 = 3_447_003; // blue
const COLOR_NEW: u32 = 5_763_719; // green
const COLOR_UPDATED: u32 = 16_776_960; // yellow
const COLOR_REMOVED: u32 = 15_158_332; // red

const AVATAR_URL: &str = "https://cdn-icons-png.flaticon.com/512/4365/4365271.png";

const DESCRIPTION_LIMIT: usize = 200;

pub struct DiscordNotifier {
    client: WebhookClient,
}

impl DiscordNotifier {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let client =
            WebhookClient::new(webhook_url).context("Failed to create Discord webhook client")?;
        Ok(Self { client })
    }

    /// Build the webhook message for a diff with changes.
    pub fn build_payload(diff: &DiffResult) -> WebhookPayload {
        let mut payload = WebhookPayload::new()
            .with_username("Career Watch")
            .with_avatar_url(AVATAR_URL)
            .with_content(format!("Job updates for **{}**", diff.company_name))
            .with_embed(
                Embed::new()
                    .with_title("Career Page")
                    .with_url(&diff.source_url)
                    .with_description("Click the title to visit the career page")
                    .with_color(COLOR_SOURCE)
                    .with_footer(format!("Last updated: {}", Utc::now().to_rfc2822())),
            );

        if !diff.new_jobs.is_empty() {
            let mut embed = Embed::new()
                .with_title(format!("New Jobs ({})", diff.new_jobs.len()))
                .with_description("The following jobs have been newly listed:")
                .with_color(COLOR_NEW);
            for job in &diff.new_jobs {
                embed = embed.with_field(
                    &job.title,
                    format!("[View Job]({})\n{}", job.url, Self::job_details(job)),
                );
                if !job.description.is_empty() {
                    embed = embed.with_field(
                        "Description",
                        truncate(&job.description, DESCRIPTION_LIMIT),
                    );
                }
            }
            payload = payload.with_embed(embed);
        }

        if !diff.updated_jobs.is_empty() {
            let mut embed = Embed::new()
                .with_title(format!("Updated Jobs ({})", diff.updated_jobs.len()))
                .with_description("The following jobs have been updated:")
                .with_color(COLOR_UPDATED);
            for job in &diff.updated_jobs {
                embed = embed.with_field(&job.title, format!("[View Job]({})", job.url));
            }
            payload = payload.with_embed(embed);
        }

        if !diff.removed_jobs.is_empty() {
            let mut embed = Embed::new()
                .with_title(format!("Removed Jobs ({})", diff.removed_jobs.len()))
                .with_description("The following jobs are no longer listed:")
                .with_color(COLOR_REMOVED);
            for job in &diff.removed_jobs {
                embed = embed.with_field(&job.title, Self::job_details(job));
            }
            payload = payload.with_embed(embed);
        }

        payload
    }

    fn job_details(job: &Job) -> String {
        let mut details = Vec::new();
        if !job.department.is_empty() {
            details.push(format!("Department: {}", job.department));
        }
        if !job.location.is_empty() {
            details.push(format!("Location: {}", job.location));
        }

        if details.is_empty() {
            "No additional details".to_string()
        } else {
            details.join(" | ")
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, diff: &DiffResult) -> Result<()> {
        // Skip if there are no changes
        if !diff.has_changes() {
            return Ok(());
        }

        let payload = Self::build_payload(diff);
        debug!(
            source = %diff.source_url,
            embeds = payload.embeds.len(),
            "Sending Discord webhook"
        );
        self.client
            .execute(&payload)
            .await
            .context("Discord webhook delivery failed")?;
        Ok(())
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
