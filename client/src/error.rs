use shared::ProtocolError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("Login rejected: {0}")]
    LoginRejected(String),
    #[error("Server closed the connection during login")]
    ConnectionClosed,
    #[error("Unexpected packet from server: {0}")]
    UnexpectedPacket(String),
}
