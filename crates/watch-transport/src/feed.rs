//! File-backed chat transport.
//!
//! Layout under the feed root:
//!
//! ```text
//! <root>/<account>/.password      optional; must match the configured password
//! <root>/<account>/<room>.jsonl   one message per line, appended over time
//! ```
//!
//! Each resolved room gets a background task that tails its feed file into
//! the room channel. The stream ends when the file disappears, when the room
//! is dropped, or (without follow mode) at end of file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use watch_core::config::AccountConfig;
use watch_core::models::ChatMessage;

use crate::reader;
use crate::transport::{ChatTransport, Room, TransportError, ROOM_CHANNEL_CAPACITY};

/// Name of the optional per-account password file.
pub const PASSWORD_FILE: &str = ".password";

/// Extension of room feed files.
pub const FEED_EXTENSION: &str = "jsonl";

/// A [`ChatTransport`] reading rooms from JSONL files on disk.
#[derive(Debug, Clone)]
pub struct FeedTransport {
    root: PathBuf,
    follow: bool,
    poll_interval: Duration,
}

/// A logged-in feed account.
#[derive(Debug, Clone)]
pub struct FeedSession {
    account: String,
    dir: PathBuf,
}

impl FeedSession {
    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FeedTransport {
    /// Create a transport rooted at `root`.
    ///
    /// With `follow` set, rooms keep polling their feed every
    /// `poll_interval` for appended lines; otherwise each room ends once its
    /// current contents have been delivered.
    pub fn new(root: impl Into<PathBuf>, follow: bool, poll_interval: Duration) -> Self {
        Self {
            root: root.into(),
            follow,
            poll_interval,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ChatTransport for FeedTransport {
    type Session = FeedSession;

    async fn login(&self, account: &AccountConfig) -> Result<FeedSession, TransportError> {
        let dir = self.root.join(&account.name);
        if !tokio::fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()) {
            return Err(TransportError::AuthenticationFailed {
                account: account.name.clone(),
                reason: format!("no feed directory at {}", dir.display()),
            });
        }

        match tokio::fs::read_to_string(dir.join(PASSWORD_FILE)).await {
            Ok(expected) if expected.trim_end_matches(['\r', '\n']) != account.password => {
                return Err(TransportError::AuthenticationFailed {
                    account: account.name.clone(),
                    reason: "invalid login or password".to_string(),
                });
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        debug!(account = %account.name, login = %account.login, ssl = account.ssl, "feed session opened");
        Ok(FeedSession {
            account: account.name.clone(),
            dir,
        })
    }

    async fn find_room_by_name(
        &self,
        session: &FeedSession,
        name: &str,
    ) -> Result<Room, TransportError> {
        let not_found = || TransportError::RoomNotFound {
            room: name.to_string(),
        };

        if !is_plain_room_name(name) {
            return Err(not_found());
        }

        let path = session.dir.join(format!("{name}.{FEED_EXTENSION}"));
        let len = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(not_found()),
        };
        // A followed room only sees lines appended after it was joined.
        let start = if self.follow { len } else { 0 };

        let (tx, room) = Room::channel(name, ROOM_CHANNEL_CAPACITY);
        info!(account = %session.account, room = name, path = %path.display(), start, "tailing room feed");
        tokio::spawn(pump_feed(path, start, tx, self.follow, self.poll_interval));
        Ok(room)
    }
}

/// Room names map straight to file names, so anything that could escape the
/// account directory is rejected.
fn is_plain_room_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.')
}

/// Copy feed lines into the room channel until the feed or the room goes away.
async fn pump_feed(
    path: PathBuf,
    mut offset: u64,
    tx: mpsc::Sender<ChatMessage>,
    follow: bool,
    poll_interval: Duration,
) {
    loop {
        let chunk = match reader::read_appended(&path, offset, !follow).await {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "feed unavailable; closing room stream");
                return;
            }
        };
        offset = chunk.offset;

        for msg in chunk.messages {
            if tx.send(msg).await.is_err() {
                debug!(path = %path.display(), "room dropped; stopping feed");
                return;
            }
        }

        if !follow {
            debug!(path = %path.display(), "end of feed");
            return;
        }

        tokio::select! {
            _ = tx.closed() => return,
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
}
