use anyhow::{Context, Result};
use canvas_grade_widget::api::CanvasClient;
use canvas_grade_widget::config::ConfigStore;
use canvas_grade_widget::scheduler::RefreshScheduler;
use canvas_grade_widget::sink::LogSink;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let store = ConfigStore::open().context("Failed to locate configuration")?;
    let config = store.load().context("Failed to load configuration")?;

    if !config.is_configured() {
        eprintln!("Canvas endpoint or API token is not configured.");
        eprintln!("Set CANVAS_BASE_URL and CANVAS_API_TOKEN (environment or .env),");
        eprintln!("or edit {}.", store.path().display());
        eprintln!();
        eprintln!("To get an API token: log into Canvas, go to Account > Settings,");
        eprintln!("scroll to 'Approved Integrations' and click '+ New Access Token'.");
        return Ok(());
    }

    let client = CanvasClient::new(&config.base_url, &config.api_token)
        .with_timeouts(config.list_timeout(), config.grade_timeout());

    // Headless sink; the real widget shell plugs its own UpdateSink in here
    let sink = Arc::new(LogSink);
    let (scheduler, handle) = RefreshScheduler::new(client, store, config, sink);
    let engine = tokio::spawn(scheduler.run());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    handle.shutdown();
    engine.await.context("Scheduler task panicked")?;

    Ok(())
}
