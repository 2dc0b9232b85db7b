//! # Chat Relay Server Library
//!
//! This library provides the server side of a multi-user text chat relay.
//! Clients log in over a persistent TCP connection, and every message one
//! client sends is relayed to every connected client, the sender included.
//!
//! ## Core Responsibilities
//!
//! ### Authentication
//! The first frame on every connection must carry a user identifier and a
//! secret. Both are checked against an immutable credential table loaded at
//! startup; a failed login closes only that connection.
//!
//! ### Session Tracking
//! The session registry is the single source of truth for who is online. A
//! session is registered after a successful login and removed when its
//! connection ends or a delivery to it fails. Logging in twice under the same
//! identifier displaces the earlier session.
//!
//! ### Message Fan-out
//! Each received message is pushed to a snapshot of the registry. Sends happen
//! outside the registry lock and are bounded by a timeout; recipients that fail
//! are evicted in one batch after the pass.
//!
//! ## Architecture Design
//!
//! ### Task per Connection
//! Every accepted connection runs in its own tokio task, with a second task
//! draining its outbound queue into the socket. The registry and the credential
//! store are the only state shared between tasks.
//!
//! ### Failure Isolation
//! Authentication and transport errors end the affected connection and are
//! logged by the accept loop. Registry operations never fail.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! JSON configuration: listen address, send timeout and the user table.
//!
//! ### Credentials Module (`credentials`)
//! Read-only user table and the login check.
//!
//! ### Session Registry Module (`session_registry`)
//! Concurrent map from user identifier to outbound sink.
//!
//! ### Broadcast Module (`broadcast`)
//! Snapshot-then-send fan-out with deferred eviction.
//!
//! ### Stream Handler Module (`stream_handler`)
//! Per-connection state machine: authenticate, register, receive, clean up.
//!
//! ### Network Module (`network`)
//! TCP listener and accept loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::credentials::CredentialStore;
//! use server::network::ChatServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::load("config.json")?;
//!     let credentials = CredentialStore::from_config(&config);
//!
//!     let server = ChatServer::bind(
//!         &config.listen_address(),
//!         credentials,
//!         config.send_timeout(),
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod credentials;
pub mod error;
pub mod network;
pub mod session_registry;
pub mod stream_handler;
