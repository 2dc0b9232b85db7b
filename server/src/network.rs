//! TCP accept loop spawning one stream handler per connection

use crate::credentials::CredentialStore;
use crate::session_registry::SessionRegistry;
use crate::stream_handler::StreamHandler;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// Chat relay server owning the listener and the shared session state
pub struct ChatServer {
    listener: TcpListener,
    credentials: Arc<CredentialStore>,
    registry: Arc<SessionRegistry>,
    send_timeout: Duration,
}

impl ChatServer {
    pub async fn bind(
        addr: &str,
        credentials: CredentialStore,
        send_timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(ChatServer {
            listener,
            credentials: Arc::new(credentials),
            registry: Arc::new(SessionRegistry::new()),
            send_timeout,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accepts connections until the listener fails.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(e) => {
                    // Transient, e.g. out of file descriptors
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Could not set TCP_NODELAY for {}: {}", peer, e);
        }

        let mut handler = StreamHandler::new(
            Arc::clone(&self.credentials),
            Arc::clone(&self.registry),
            self.send_timeout,
            peer.to_string(),
        );

        tokio::spawn(async move {
            if let Err(e) = handler.run(stream).await {
                warn!("Connection from {} closed with error: {}", peer, e);
            }
        });
    }
}
