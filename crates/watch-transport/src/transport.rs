//! The transport trait and the live room handle.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use watch_core::config::AccountConfig;
use watch_core::models::ChatMessage;

/// Buffered messages per room before the producer waits for the monitor.
pub const ROOM_CHANNEL_CAPACITY: usize = 256;

/// Errors raised while establishing a session or resolving a room.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The account could not log in.
    #[error("Authentication failed for {account}: {reason}")]
    AuthenticationFailed { account: String, reason: String },

    /// No room with this name exists for the session.
    #[error("Room not found: {room}")]
    RoomNotFound { room: String },

    /// Pass-through for I/O errors raised by the underlying transport.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A resolved room and its live message stream.
///
/// The stream ends (`next_message` returns `None`) once the producer side
/// is dropped, whatever the reason.
#[derive(Debug)]
pub struct Room {
    name: String,
    messages: mpsc::Receiver<ChatMessage>,
}

impl Room {
    pub fn new(name: impl Into<String>, messages: mpsc::Receiver<ChatMessage>) -> Self {
        Self {
            name: name.into(),
            messages,
        }
    }

    /// Create a room together with the sender that feeds it.
    pub fn channel(name: impl Into<String>, capacity: usize) -> (mpsc::Sender<ChatMessage>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(name, rx))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the next message. `None` means the stream has closed.
    pub async fn next_message(&mut self) -> Option<ChatMessage> {
        self.messages.recv().await
    }
}

/// Session establishment and room lookup for one chat service.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    /// Logged-in session state for one account.
    type Session: Send + Sync;

    /// Log in with the account's credentials.
    async fn login(&self, account: &AccountConfig) -> Result<Self::Session, TransportError>;

    /// Resolve a room by name and subscribe to its live stream.
    async fn find_room_by_name(
        &self,
        session: &Self::Session,
        name: &str,
    ) -> Result<Room, TransportError>;
}
