//! Terminal rendering of received chat messages

use chrono::{DateTime, Local};
use shared::ChatMessage;
use std::fmt;

/// A chat message stamped with the local time it arrived.
///
/// The timestamp is only for display; it never goes over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    pub message: ChatMessage,
    pub received_at: DateTime<Local>,
}

impl ReceivedMessage {
    pub fn new(message: ChatMessage, received_at: DateTime<Local>) -> Self {
        Self {
            message,
            received_at,
        }
    }

    pub fn now(message: ChatMessage) -> Self {
        Self::new(message, Local::now())
    }
}

impl fmt::Display for ReceivedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.received_at.format("%H:%M:%S"),
            self.message.sender,
            self.message.text
        )
    }
}
