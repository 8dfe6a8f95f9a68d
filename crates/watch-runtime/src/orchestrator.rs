//! Session orchestration.
//!
//! Logs in to every configured account, resolves its rooms, and spawns one
//! [`RoomMonitor`] task per resolved room into a [`MonitorGroup`]. Failures
//! are per account or per room: they raise a notification and the rest of
//! the configuration carries on.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use watch_core::config::{AccountConfig, WatchConfig};
use watch_core::models::{NotificationRequest, NotifyOptions};
use watch_transport::ChatTransport;

use crate::notifier::Notifier;
use crate::room_monitor::{MonitorReport, RoomMonitor};

// ── SessionOrchestrator ───────────────────────────────────────────────────────

pub struct SessionOrchestrator<T: ChatTransport> {
    transport: Arc<T>,
    notifier: Arc<dyn Notifier>,
}

impl<T: ChatTransport> SessionOrchestrator<T> {
    pub fn new(transport: T, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            transport: Arc::new(transport),
            notifier,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start monitors for every account and wait until all of them stop.
    pub async fn run(&self, config: &WatchConfig) -> Vec<MonitorReport> {
        let mut group = self.start(config).await;
        group.join_all().await
    }

    /// Start monitors for every resolvable room and return without waiting.
    pub async fn start(&self, config: &WatchConfig) -> MonitorGroup {
        let mut group = MonitorGroup::default();

        for account in &config.accounts {
            self.start_account(account, &mut group).await;
        }

        info!(monitors = group.len(), "all accounts processed");
        group
    }

    async fn start_account(&self, account: &AccountConfig, group: &mut MonitorGroup) {
        if account.rooms.is_empty() {
            debug!(account = %account.name, "no rooms configured; skipping login");
            return;
        }

        let session = match self.transport.login(account).await {
            Ok(session) => session,
            Err(e) => {
                warn!(account = %account.name, error = %e, "login failed");
                self.notifier.notify(NotificationRequest::new(
                    format!("Problem logging in to {}", account.name),
                    e.to_string(),
                    NotifyOptions::sticky(),
                ));
                return;
            }
        };

        info!(account = %account.name, "logged in");
        self.notifier.notify(NotificationRequest::new(
            format!("Successfully logged in to {}", account.name),
            "",
            NotifyOptions::default().with_icon(account.image.clone()),
        ));

        for room_cfg in &account.rooms {
            let room = match self.transport.find_room_by_name(&session, &room_cfg.name).await {
                Ok(room) => room,
                Err(e) => {
                    warn!(account = %account.name, room = %room_cfg.name, error = %e, "room not found");
                    self.notifier.notify(NotificationRequest::info(format!(
                        "Did not find {}, not monitoring",
                        room_cfg.name
                    )));
                    continue;
                }
            };

            // The transport decides how the room is displayed.
            let monitor = RoomMonitor::new(
                account.name.clone(),
                room.name(),
                room_cfg.rules.clone(),
                Arc::clone(&self.notifier),
            );
            group.spawn(monitor, room);
        }
    }
}

// ── MonitorGroup ──────────────────────────────────────────────────────────────

/// The set of running room monitors.
///
/// Dropping the group aborts every monitor still running.
#[derive(Default)]
pub struct MonitorGroup {
    tasks: JoinSet<MonitorReport>,
}

impl MonitorGroup {
    fn spawn(&mut self, monitor: RoomMonitor, room: watch_transport::Room) {
        debug!(room = %monitor.room_name(), "spawning room monitor");
        self.tasks.spawn(monitor.run(room));
    }

    /// Number of monitors not yet joined.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every monitor to stop, in completion order.
    ///
    /// Returns immediately when the group is empty. A monitor that panics is
    /// logged and left out of the result.
    pub async fn join_all(&mut self) -> Vec<MonitorReport> {
        let mut reports = Vec::with_capacity(self.tasks.len());

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(report) => {
                    info!(
                        account = %report.account,
                        room = %report.room,
                        received = report.received,
                        notified = report.notified,
                        ignored = report.ignored,
                        last_seen_id = report.last_seen_id,
                        "room monitor stopped"
                    );
                    reports.push(report);
                }
                Err(e) if e.is_cancelled() => {
                    debug!("room monitor cancelled");
                }
                Err(e) => {
                    error!(error = %e, "room monitor task failed");
                }
            }
        }

        reports
    }

    /// Abort every running monitor and wait for them to wind down.
    pub async fn shutdown(&mut self) {
        self.tasks.shutdown().await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
