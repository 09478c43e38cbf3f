use log::{debug, warn};

use crate::models::Command;
use crate::websocket::handler::ChessWebSocket;

/// Decode an inbound frame. Anything that is not a well-formed envelope is
/// logged and dropped.
pub fn parse_command(text: &str) -> Option<Command> {
    match serde_json::from_str::<Command>(text) {
        Ok(command) => Some(command),
        Err(e) => {
            warn!("Dropping malformed message: {}", e);
            None
        }
    }
}

impl ChessWebSocket {
    pub fn handle_message(&mut self, text: &str) {
        debug!("Received message from {}: {}", self.id, text);
        if let Some(command) = parse_command(text) {
            self.app_state.dispatch(&self.id, command);
        }
    }
}
