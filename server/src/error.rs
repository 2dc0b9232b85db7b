use shared::ProtocolError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Startup failure; the server must not run without a valid configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Malformed config file {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Config file {0} has no users in its auth table")]
    NoUsers(String),
    #[error("send_timeout_ms must be greater than zero")]
    ZeroSendTimeout,
}

#[derive(Error, Debug)]
pub enum AuthenticationError {
    #[error("Connection closed before sending credentials")]
    MissingCredentials,
    #[error("Expected login as the first packet")]
    UnexpectedPacket,
    #[error("Login failed for user {user}")]
    InvalidCredentials { user: String },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Outbound writer stopped")]
    WriterClosed,
    #[error("Session is no longer registered")]
    Unregistered,
}

/// Failure to hand a message to one recipient's sink.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Recipient connection is closed")]
    Closed,
    #[error("Recipient did not accept the message within {0:?}")]
    TimedOut(Duration),
}

/// Why a single connection ended; never affects other connections.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<ProtocolError> for ConnectionError {
    fn from(e: ProtocolError) -> Self {
        ConnectionError::Transport(TransportError::Protocol(e))
    }
}
