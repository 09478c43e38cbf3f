use std::collections::HashMap;
use std::sync::Mutex;

use actix::Recipient;
use log::warn;

use crate::models::lock;
use crate::models::messages::{OutboundText, ServerMessage};

/// Live connections, keyed by connection id.
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: Mutex<HashMap<String, Recipient<OutboundText>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live connections afterwards.
    pub fn register(&self, connection_id: &str, recipient: Recipient<OutboundText>) -> usize {
        let mut sessions = lock(&self.sessions);
        sessions.insert(connection_id.to_string(), recipient);
        sessions.len()
    }

    pub fn unregister(&self, connection_id: &str) -> usize {
        let mut sessions = lock(&self.sessions);
        sessions.remove(connection_id);
        sessions.len()
    }

    pub fn is_live(&self, connection_id: &str) -> bool {
        lock(&self.sessions).contains_key(connection_id)
    }

    pub fn live_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn send(&self, connection_id: &str, message: &ServerMessage) {
        self.send_many(std::slice::from_ref(&connection_id.to_string()), message);
    }

    pub fn send_many(&self, connection_ids: &[String], message: &ServerMessage) {
        let Some(text) = encode(message) else { return };
        let sessions = lock(&self.sessions);
        for connection_id in connection_ids {
            match sessions.get(connection_id) {
                Some(recipient) => recipient.do_send(OutboundText(text.clone())),
                None => warn!("Connection {} not found in sessions", connection_id),
            }
        }
    }

    pub fn send_all(&self, message: &ServerMessage) {
        let Some(text) = encode(message) else { return };
        for recipient in lock(&self.sessions).values() {
            recipient.do_send(OutboundText(text.clone()));
        }
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    serde_json::to_string(message)
        .map_err(|e| warn!("Failed to serialize message: {}", e))
        .ok()
}
