mod bootstrap;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use watch_core::config::WatchConfig;
use watch_core::settings::{state_dir, NotifierKind, Settings};
use watch_runtime::notifier::{DesktopNotifier, LogNotifier, Notifier};
use watch_runtime::orchestrator::SessionOrchestrator;
use watch_transport::FeedTransport;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::ensure_directories(&state_dir())?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("roomwatch v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = settings.config_path();
    let config = WatchConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    tracing::info!(
        accounts = config.accounts.len(),
        rooms = config.room_count(),
        config = %config_path.display(),
        "configuration loaded"
    );

    let notifier: Arc<dyn Notifier> = match settings.notifier_kind() {
        NotifierKind::Desktop => Arc::new(DesktopNotifier::new(settings.notify_send.clone())),
        NotifierKind::Log => Arc::new(LogNotifier),
    };

    let feed_dir = settings.feed_dir();
    tracing::info!(
        feed_dir = %feed_dir.display(),
        follow = settings.follow(),
        "using feed transport"
    );
    let transport = FeedTransport::new(
        feed_dir,
        settings.follow(),
        Duration::from_millis(settings.poll_interval_ms),
    );

    let orchestrator = SessionOrchestrator::new(transport, notifier);
    let mut group = orchestrator.start(&config).await;

    if group.is_empty() {
        tracing::warn!("no rooms are being monitored; exiting");
        return Ok(());
    }

    // Monitors run until their streams close. Ctrl+C is the only way to stop
    // them early; it aborts every monitor without the per-room stop alert.
    let reports = tokio::select! {
        reports = group.join_all() => reports,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(monitors = group.len(), "Ctrl+C received; shutting down room monitors");
            group.shutdown().await;
            Vec::new()
        }
    };

    let notified: u64 = reports.iter().map(|r| r.notified).sum();
    tracing::info!(
        monitors = reports.len(),
        notified,
        "all room monitors stopped"
    );

    Ok(())
}
