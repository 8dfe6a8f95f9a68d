//! Per-room message classification.
//!
//! Each room may carry a *sticky* pattern, which escalates matching messages
//! to a persistent critical notification, and an *ignore* pattern, which
//! suppresses them. Ignore always wins.

use regex::{Regex, RegexBuilder};

use crate::models::{NotifyOptions, Urgency, DEFAULT_DISMISS_DELAY_MS};

/// Outcome of running a message body through a room's rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Matched the ignore pattern; no notification.
    Ignore,
    /// Ordinary message; auto-dismissing notification.
    Normal,
    /// Matched the sticky pattern; notification stays until dismissed.
    Escalated,
}

impl Classification {
    /// Display options for this classification, or `None` for [`Ignore`].
    ///
    /// [`Ignore`]: Classification::Ignore
    pub fn notify_options(self) -> Option<NotifyOptions> {
        match self {
            Classification::Ignore => None,
            Classification::Normal => Some(NotifyOptions {
                delay_ms: Some(DEFAULT_DISMISS_DELAY_MS),
                priority: Urgency::Normal,
                icon: None,
            }),
            Classification::Escalated => Some(NotifyOptions::sticky()),
        }
    }
}

/// Compiled filter rules for one room.
#[derive(Debug, Clone, Default)]
pub struct RoomRules {
    /// Case-insensitive escalation pattern.
    pub sticky: Option<Regex>,
    /// Case-sensitive suppression pattern.
    pub ignore: Option<Regex>,
    /// Icon used for every notification raised for this room.
    pub icon: Option<String>,
}

impl RoomRules {
    /// Compile the raw pattern strings.
    ///
    /// Errors carry which pattern (`"sticky"` or `"ignore"`) failed.
    pub fn compile(
        sticky: Option<&str>,
        ignore: Option<&str>,
        icon: Option<String>,
    ) -> std::result::Result<Self, (&'static str, regex::Error)> {
        let sticky = sticky
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .transpose()
            .map_err(|e| ("sticky", e))?;
        let ignore = ignore
            .map(Regex::new)
            .transpose()
            .map_err(|e| ("ignore", e))?;
        Ok(Self {
            sticky,
            ignore,
            icon,
        })
    }
}

/// Classify a message body against `rules`.
pub fn classify(rules: &RoomRules, body: &str) -> Classification {
    if rules.ignore.as_ref().is_some_and(|re| re.is_match(body)) {
        return Classification::Ignore;
    }
    if rules.sticky.as_ref().is_some_and(|re| re.is_match(body)) {
        return Classification::Escalated;
    }
    Classification::Normal
}
