use serde::{Deserialize, Serialize};

pub mod codec;

pub use codec::{read_packet, write_packet, ProtocolError};

pub const DEFAULT_PORT: u16 = 8888;
pub const MAX_FRAME_LEN: usize = 64 * 1024;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Packet {
    Login { user: String, secret: String },
    Chat { text: String },

    LoginAccepted { user: String },
    LoginRejected { reason: String },
    Message(ChatMessage),
}

/// A chat line as relayed by the server, tagged with the sender's identity.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
        }
    }
}
