use clap::Parser;
use std::path::PathBuf;

use crate::config::WatchConfig;

/// Directory under `$HOME` holding roomwatch state (logs, feeds).
pub const STATE_DIR: &str = ".roomwatch";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Desktop notifications for chat rooms you care about
#[derive(Parser, Debug, Clone)]
#[command(
    name = "roomwatch",
    about = "Desktop notifications for chat rooms you care about",
    version
)]
pub struct Settings {
    /// Account configuration file (defaults to ~/.roomwatch.yml)
    #[arg(long, env = "ROOMWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding per-account room feeds (defaults to ~/.roomwatch/feeds)
    #[arg(long, env = "ROOMWATCH_FEED_DIR")]
    pub feed_dir: Option<PathBuf>,

    /// Stop each room at the end of its feed instead of waiting for new lines
    #[arg(long)]
    pub no_follow: bool,

    /// How often to check feeds for new lines, in milliseconds (50-60000)
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(50..=60_000))]
    pub poll_interval_ms: u64,

    /// Where notifications go
    #[arg(long, default_value = "desktop", value_parser = ["desktop", "log"])]
    pub notifier: String,

    /// Path to the notify-send binary
    #[arg(long, default_value = "notify-send")]
    pub notify_send: String,

    /// Log notifications instead of showing them (same as --notifier log)
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Which notifier gateway to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Desktop,
    Log,
}

impl Settings {
    /// Explicit `--config`, else `~/.roomwatch.yml`.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(WatchConfig::default_path)
    }

    /// Explicit `--feed-dir`, else `~/.roomwatch/feeds`.
    pub fn feed_dir(&self) -> PathBuf {
        self.feed_dir
            .clone()
            .unwrap_or_else(|| state_dir().join("feeds"))
    }

    pub fn follow(&self) -> bool {
        !self.no_follow
    }

    pub fn notifier_kind(&self) -> NotifierKind {
        if self.dry_run || self.notifier == "log" {
            NotifierKind::Log
        } else {
            NotifierKind::Desktop
        }
    }
}

/// `~/.roomwatch`, or `./.roomwatch` when there is no home directory.
pub fn state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STATE_DIR)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
