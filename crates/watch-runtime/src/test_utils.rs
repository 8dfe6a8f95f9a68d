//! Shared fakes for runtime tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use watch_core::config::AccountConfig;
use watch_core::models::{ChatMessage, NotificationRequest};
use watch_transport::{ChatTransport, Room, TransportError};

use crate::notifier::Notifier;

/// Notifier that keeps every request in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationRequest>>,
}

impl RecordingNotifier {
    pub fn requests(&self) -> Vec<NotificationRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.title).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, request: NotificationRequest) {
        self.sent.lock().unwrap().push(request);
    }
}

/// In-memory transport with scripted rooms.
///
/// Each scripted room delivers its messages once and then closes.
#[derive(Debug, Default)]
pub struct StubTransport {
    rejected: HashSet<String>,
    rooms: Mutex<HashMap<(String, String), Vec<ChatMessage>>>,
    display_names: HashMap<String, String>,
    logins: Mutex<Vec<String>>,
}

impl StubTransport {
    /// Make logins for `account` fail.
    pub fn reject(mut self, account: &str) -> Self {
        self.rejected.insert(account.to_string());
        self
    }

    /// Script a room under `account`.
    pub fn room(self, account: &str, room: &str, messages: Vec<ChatMessage>) -> Self {
        self.rooms
            .lock()
            .unwrap()
            .insert((account.to_string(), room.to_string()), messages);
        self
    }

    /// Resolve `requested` to a room the server calls `actual`.
    pub fn display_name(mut self, requested: &str, actual: &str) -> Self {
        self.display_names
            .insert(requested.to_string(), actual.to_string());
        self
    }

    /// Accounts that attempted to log in, in order.
    pub fn logins(&self) -> Vec<String> {
        self.logins.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for StubTransport {
    type Session = String;

    async fn login(&self, account: &AccountConfig) -> Result<String, TransportError> {
        self.logins.lock().unwrap().push(account.name.clone());
        if self.rejected.contains(&account.name) {
            return Err(TransportError::AuthenticationFailed {
                account: account.name.clone(),
                reason: "bad credentials".to_string(),
            });
        }
        Ok(account.name.clone())
    }

    async fn find_room_by_name(&self, session: &String, name: &str) -> Result<Room, TransportError> {
        let messages = self
            .rooms
            .lock()
            .unwrap()
            .remove(&(session.clone(), name.to_string()))
            .ok_or_else(|| TransportError::RoomNotFound {
                room: name.to_string(),
            })?;

        let resolved = self.display_names.get(name).map_or(name, String::as_str);
        let (tx, room) = Room::channel(resolved, messages.len().max(1));
        for msg in messages {
            tx.try_send(msg).expect("channel sized for script");
        }
        Ok(room)
    }
}
