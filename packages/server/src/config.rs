use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;

/// Which notifier implementation to wire in at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Discord,
    Log,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub watch_urls: Vec<String>,
    /// Cron spec with seconds, e.g. `0 */5 * * * *` for every five minutes.
    pub schedule: String,
    pub notifier: NotifierKind,
    pub discord_webhook_url: Option<String>,
    pub scrape_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let watch_urls =
            parse_url_list(&env::var("WATCH_URLS").context("WATCH_URLS must be set")?);
        if watch_urls.is_empty() {
            bail!("WATCH_URLS must contain at least one URL");
        }

        let schedule =
            env::var("WATCH_SCHEDULE").unwrap_or_else(|_| "0 */5 * * * *".to_string());

        let notifier = match env::var("NOTIFIER").as_deref() {
            Ok("discord") | Err(_) => NotifierKind::Discord,
            Ok("log") => NotifierKind::Log,
            Ok(other) => bail!("unknown notifier type: {other}"),
        };

        let discord_webhook_url = env::var("DISCORD_WEBHOOK_URL").ok();
        if notifier == NotifierKind::Discord && discord_webhook_url.is_none() {
            bail!("DISCORD_WEBHOOK_URL must be set for the discord notifier");
        }

        let scrape_timeout_secs = env::var("SCRAPE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("SCRAPE_TIMEOUT_SECS must be a valid number")?;

        Ok(Self {
            watch_urls,
            schedule,
            notifier,
            discord_webhook_url,
            scrape_timeout_secs,
        })
    }
}

/// Split a comma-separated URL list, dropping padding and empty entries.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_urls() {
        let urls = parse_url_list(" https://a.example/careers , https://b.example/jobs ");
        assert_eq!(urls, ["https://a.example/careers", "https://b.example/jobs"]);
    }

    #[test]
    fn drops_empty_entries() {
        let urls = parse_url_list("https://a.example/careers,,  ,");
        assert_eq!(urls, ["https://a.example/careers"]);
    }

    #[test]
    fn empty_input_yields_no_urls() {
        assert!(parse_url_list("").is_empty());
    }
}
