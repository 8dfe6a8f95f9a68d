//! Per-room monitoring loop.
//!
//! A [`RoomMonitor`] owns one [`Room`] for its whole life. It announces
//! itself, then turns every message delivered by the room's stream into at
//! most one notification:
//!
//! 1. drop heartbeats (no author);
//! 2. drop stale or duplicate ids (`id <= last_seen`);
//! 3. classify with the room's rules and drop ignored messages;
//! 4. sanitize and hand the notification to the [`Notifier`].
//!
//! When the stream closes the monitor raises a persistent critical
//! notification and returns a [`MonitorReport`]. There is no retry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use watch_core::filter::{classify, Classification, RoomRules};
use watch_core::models::{ChatMessage, NotificationRequest, NotifyOptions};
use watch_core::sanitize::{sanitize, strip_title_quotes};
use watch_transport::Room;

use crate::notifier::Notifier;

// ── Public types ──────────────────────────────────────────────────────────────

/// Lifecycle of a room monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Starting,
    Listening,
    Stopped,
}

/// What happened to a single delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// No author; keep-alive traffic.
    Heartbeat,
    /// Id was not newer than the last one seen.
    Stale,
    /// Matched the room's ignore pattern.
    Ignored,
    /// A notification was sent with this classification.
    Notified(Classification),
}

/// Summary returned when a monitor stops.
#[derive(Debug, Clone)]
pub struct MonitorReport {
    pub account: String,
    pub room: String,
    /// Messages delivered by the stream.
    pub received: u64,
    pub heartbeats: u64,
    pub stale: u64,
    pub ignored: u64,
    pub notified: u64,
    pub last_seen_id: u64,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
}

// ── RoomMonitor ───────────────────────────────────────────────────────────────

pub struct RoomMonitor {
    account: String,
    /// Room name with title delimiters removed.
    room_name: String,
    rules: RoomRules,
    notifier: Arc<dyn Notifier>,
    state: MonitorState,
    /// 0 until the first message is accepted.
    last_seen_id: u64,
    received: u64,
    heartbeats: u64,
    stale: u64,
    ignored: u64,
    notified: u64,
    started_at: DateTime<Utc>,
}

impl RoomMonitor {
    pub fn new(
        account: impl Into<String>,
        room_name: &str,
        rules: RoomRules,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            account: account.into(),
            room_name: strip_title_quotes(room_name),
            rules,
            notifier,
            state: MonitorState::Starting,
            last_seen_id: 0,
            received: 0,
            heartbeats: 0,
            stale: 0,
            ignored: 0,
            notified: 0,
            started_at: Utc::now(),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn last_seen_id(&self) -> u64 {
        self.last_seen_id
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    /// Consume `room` until its stream closes.
    pub async fn run(mut self, mut room: Room) -> MonitorReport {
        self.start();

        while let Some(msg) = room.next_message().await {
            self.handle(msg);
        }

        self.stop()
    }

    /// `Starting` → `Listening`; announces the room.
    pub fn start(&mut self) {
        if self.state != MonitorState::Starting {
            return;
        }
        self.last_seen_id = 0;
        self.started_at = Utc::now();

        info!(account = %self.account, room = %self.room_name, "now monitoring room");
        self.notifier.notify(NotificationRequest::new(
            format!("Now monitoring {}", self.room_name),
            "",
            NotifyOptions::default().with_icon(self.rules.icon.clone()),
        ));
        self.state = MonitorState::Listening;
    }

    /// Process one delivered message.
    pub fn handle(&mut self, msg: ChatMessage) -> MessageOutcome {
        self.received += 1;

        if msg.is_heartbeat() {
            self.heartbeats += 1;
            return MessageOutcome::Heartbeat;
        }

        if msg.id <= self.last_seen_id {
            self.stale += 1;
            debug!(room = %self.room_name, id = msg.id, last_seen = self.last_seen_id, "stale message dropped");
            return MessageOutcome::Stale;
        }
        self.last_seen_id = msg.id;

        let class = classify(&self.rules, &msg.message);
        let Some(options) = class.notify_options() else {
            self.ignored += 1;
            debug!(room = %self.room_name, id = msg.id, "message ignored");
            return MessageOutcome::Ignored;
        };

        let author = strip_title_quotes(&msg.person);
        let request = NotificationRequest::new(
            format!("{author} in {}", self.room_name),
            sanitize(&msg.message),
            options.with_icon(self.rules.icon.clone()),
        );
        debug!(room = %self.room_name, id = msg.id, ?class, "notifying");
        self.notifier.notify(request);
        self.notified += 1;

        MessageOutcome::Notified(class)
    }

    /// `Listening` → `Stopped`; raises the stop alert and returns the report.
    pub fn stop(&mut self) -> MonitorReport {
        if self.state != MonitorState::Stopped {
            self.state = MonitorState::Stopped;
            info!(account = %self.account, room = %self.room_name, "room stream closed");
            self.notifier.notify(NotificationRequest::new(
                format!("Stopped monitoring {} for some reason", self.room_name),
                "",
                NotifyOptions::sticky(),
            ));
        }

        MonitorReport {
            account: self.account.clone(),
            room: self.room_name.clone(),
            received: self.received,
            heartbeats: self.heartbeats,
            stale: self.stale,
            ignored: self.ignored,
            notified: self.notified,
            last_seen_id: self.last_seen_id,
            started_at: self.started_at,
            stopped_at: Utc::now(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
