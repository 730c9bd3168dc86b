// Main entry point for the career page watcher

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server_core::config::{Config, NotifierKind};
use server_core::kernel::{CronScheduler, DiscordNotifier, LogNotifier, PageScraper};
use watcher::{MemoryRepository, Notifier, ScheduledJob, Scheduler, WatcherService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,watcher=debug,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting career page watcher");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        sources = config.watch_urls.len(),
        schedule = %config.schedule,
        "Configuration loaded"
    );

    // Wire adapters into the pipeline
    let scraper = Arc::new(
        PageScraper::new(Duration::from_secs(config.scrape_timeout_secs))
            .context("Failed to build scraper")?,
    );
    let repository = Arc::new(MemoryRepository::new());
    let notifier: Arc<dyn Notifier> = match config.notifier {
        NotifierKind::Discord => {
            let webhook_url = config
                .discord_webhook_url
                .as_deref()
                .context("Discord webhook URL is required for the discord notifier")?;
            Arc::new(DiscordNotifier::new(webhook_url).context("Failed to build Discord notifier")?)
        }
        NotifierKind::Log => Arc::new(LogNotifier::new()),
    };

    let service = Arc::new(WatcherService::new(
        scraper,
        notifier,
        repository,
        config.watch_urls.clone(),
    ));

    let scheduler = CronScheduler::new()
        .await
        .context("Failed to create scheduler")?;

    // Run one pass immediately so a fresh process has baselines before the
    // first tick.
    tracing::info!("Running initial watch pass");
    service.run_once(&scheduler.cancellation_token()).await;

    // Schedule recurring passes
    let pass_service = service.clone();
    let pass: ScheduledJob = Arc::new(move |cancel| {
        let service = pass_service.clone();
        Box::pin(async move {
            service.run_once(&cancel).await;
            Ok(())
        })
    });
    scheduler
        .schedule(&config.schedule, pass)
        .await
        .context("Failed to schedule watch pass")?;
    scheduler.start().await.context("Failed to start scheduler")?;
    tracing::info!(
        sources = config.watch_urls.len(),
        schedule = %config.schedule,
        "Career page watcher running"
    );

    // Wait for termination signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down...");

    scheduler.stop().await.context("Failed to stop scheduler")?;
    tracing::info!("Shutdown complete");

    Ok(())
}
