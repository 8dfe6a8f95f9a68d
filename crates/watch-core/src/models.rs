use serde::{Deserialize, Serialize};

/// Default time a normal notification stays on screen, in milliseconds.
pub const DEFAULT_DISMISS_DELAY_MS: u64 = 20_000;

/// A single decoded chat message as delivered by a room's live stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Per-room message identifier. Increases over time but may arrive out
    /// of order or with gaps.
    pub id: u64,
    /// Author display name. Empty for heartbeats and other system events.
    #[serde(default)]
    pub person: String,
    /// Raw message body.
    #[serde(default)]
    pub message: String,
}

impl ChatMessage {
    pub fn new(id: u64, person: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id,
            person: person.into(),
            message: message.into(),
        }
    }

    /// `true` for messages without a real author (keep-alive pings).
    pub fn is_heartbeat(&self) -> bool {
        self.person.trim().is_empty()
    }
}

/// Notification urgency understood by the platform notifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Normal,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display options attached to a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyOptions {
    /// Milliseconds before auto-dismiss. `Some(0)` keeps the notification up
    /// until it is clicked away; `None` leaves the choice to the platform.
    pub delay_ms: Option<u64>,
    pub priority: Urgency,
    /// Icon path or theme name.
    pub icon: Option<String>,
}

impl NotifyOptions {
    /// Persistent, critical notification.
    pub fn sticky() -> Self {
        Self {
            delay_ms: Some(0),
            priority: Urgency::Critical,
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon;
        self
    }
}

/// A notification waiting to be handed to the notifier gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub options: NotifyOptions,
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>, options: NotifyOptions) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            options,
        }
    }

    /// A title-only notification with platform-default display options.
    pub fn info(title: impl Into<String>) -> Self {
        Self::new(title, "", NotifyOptions::default())
    }
}
