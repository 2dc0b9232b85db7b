//! Per-connection protocol loop
//!
//! Each accepted connection gets its own [`StreamHandler`], which moves
//! through `Connecting -> Authenticating -> Active -> Closed`:
//! - the first frame must be a login, checked against the credential store
//! - a successful login registers the connection's sink in the registry
//! - every chat packet received afterwards is broadcast to all sessions
//! - end of stream or a transport error unregisters the session
//! - a stopped writer or a removed session closes the connection
//!
//! Outbound traffic goes through a bounded queue drained by a writer task,
//! so a broadcast never writes to a socket directly.

use crate::broadcast::broadcast;
use crate::credentials::CredentialStore;
use crate::error::{AuthenticationError, ConnectionError, TransportError};
use crate::session_registry::{Session, SessionRegistry};
use log::{debug, info, warn};
use shared::{read_packet, write_packet, ChatMessage, Packet};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Capacity of each connection's outbound queue
pub const OUTBOUND_QUEUE_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Authenticating,
    Active,
    Closed,
}

pub struct StreamHandler {
    credentials: Arc<CredentialStore>,
    registry: Arc<SessionRegistry>,
    send_timeout: Duration,
    peer: String,
    state: ConnectionState,
}

impl StreamHandler {
    pub fn new(
        credentials: Arc<CredentialStore>,
        registry: Arc<SessionRegistry>,
        send_timeout: Duration,
        peer: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            registry,
            send_timeout,
            peer: peer.into(),
            state: ConnectionState::Connecting,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Drives one connection until it closes.
    ///
    /// Returns `Ok` on a clean end of stream. Authentication and transport
    /// failures are returned to the caller and only affect this connection.
    pub async fn run<S>(&mut self, stream: S) -> Result<(), ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut reader, mut writer) = tokio::io::split(stream);
        self.state = ConnectionState::Authenticating;

        let user = match self.authenticate(&mut reader).await {
            Ok(user) => user,
            Err(e) => {
                self.state = ConnectionState::Closed;
                if let ConnectionError::Authentication(auth_error) = &e {
                    self.reject(&mut writer, auth_error).await;
                }
                return Err(e);
            }
        };

        let (sink, queue) = mpsc::channel(OUTBOUND_QUEUE_LEN);
        // The queue is fresh and its receiver is alive, so this cannot fail.
        let _ = sink
            .send(Packet::LoginAccepted { user: user.clone() })
            .await;
        let session = self.registry.register(&user, sink).await;
        let mut writer_task = tokio::spawn(write_outbound(
            writer,
            queue,
            self.send_timeout,
            user.clone(),
        ));
        self.state = ConnectionState::Active;

        let result = self
            .receive_loop(&mut reader, &session, &mut writer_task)
            .await;

        self.state = ConnectionState::Closed;
        self.registry.unregister_session(&session).await;
        drop(session);
        if !writer_task.is_finished() {
            let _ = writer_task.await;
        }

        result
    }

    async fn authenticate<R>(&self, reader: &mut R) -> Result<String, ConnectionError>
    where
        R: AsyncRead + Unpin,
    {
        match read_packet(reader).await? {
            Some(Packet::Login { user, secret }) => {
                if self.credentials.verify(&user, &secret) {
                    info!("User {} logged in from {}", user, self.peer);
                    Ok(user)
                } else {
                    Err(AuthenticationError::InvalidCredentials { user }.into())
                }
            }
            Some(_) => Err(AuthenticationError::UnexpectedPacket.into()),
            None => Err(AuthenticationError::MissingCredentials.into()),
        }
    }

    /// Best-effort notice to the client before the connection is dropped.
    async fn reject<W>(&self, writer: &mut W, error: &AuthenticationError)
    where
        W: AsyncWrite + Unpin,
    {
        warn!("Rejecting connection from {}: {}", self.peer, error);
        let packet = Packet::LoginRejected {
            reason: error.to_string(),
        };
        match timeout(self.send_timeout, write_packet(writer, &packet)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Could not send rejection to {}: {}", self.peer, e),
            Err(_) => debug!("Timed out sending rejection to {}", self.peer),
        }
        let _ = writer.shutdown().await;
    }

    /// Relays chat from this connection until it ends.
    ///
    /// The loop also ends when the outbound writer stops or the session is
    /// no longer registered, so an evicted connection cannot keep talking.
    async fn receive_loop<R>(
        &self,
        reader: &mut R,
        session: &Session,
        writer_task: &mut JoinHandle<()>,
    ) -> Result<(), ConnectionError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let packet = tokio::select! {
                packet = read_packet(reader) => packet,
                _ = &mut *writer_task => {
                    warn!(
                        "Closing connection of user {}: outbound writer stopped",
                        session.user
                    );
                    return Err(TransportError::WriterClosed.into());
                }
            };

            match packet {
                Ok(Some(Packet::Chat { text })) => {
                    if !self.registry.is_registered(session).await {
                        warn!(
                            "Closing connection of user {}: session was removed",
                            session.user
                        );
                        return Err(TransportError::Unregistered.into());
                    }
                    info!("Received message {:?} from user {}", text, session.user);
                    let message = ChatMessage::new(session.user.clone(), text);
                    let report = broadcast(&self.registry, &message, self.send_timeout).await;
                    debug!(
                        "Message from {} delivered to {} session(s), {} evicted",
                        session.user,
                        report.delivered,
                        report.evicted.len()
                    );
                }
                Ok(Some(other)) => {
                    warn!(
                        "Ignoring unexpected packet from user {}: {:?}",
                        session.user, other
                    );
                }
                Ok(None) => {
                    info!("User {} disconnected", session.user);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Connection of user {} failed: {}", session.user, e);
                    return Err(TransportError::Protocol(e).into());
                }
            }
        }
    }
}

/// Drains a session's outbound queue into the socket.
///
/// Exits on the first failed or timed-out write, dropping the queue so that
/// further deliveries to this session fail and evict it. The handler sees the
/// exit and closes the connection.
async fn write_outbound<W>(
    mut writer: W,
    mut queue: mpsc::Receiver<Packet>,
    send_timeout: Duration,
    user: String,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(packet) = queue.recv().await {
        match timeout(send_timeout, write_packet(&mut writer, &packet)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Failed to write to user {}: {}", user, e);
                return;
            }
            Err(_) => {
                warn!("Timed out writing to user {} after {:?}", user, send_timeout);
                return;
            }
        }
    }
    let _ = writer.shutdown().await;
}
