//! # Chat Relay Client Library
//!
//! A line-oriented terminal client for the chat relay server.
//!
//! ## Session Flow
//!
//! The client opens a TCP connection, sends its user identifier and secret as
//! the first frame, and waits for the server to accept or reject the login.
//! Once accepted, a background task reads every relayed message off the
//! socket and queues it, stamped with its local receipt time, for the
//! interactive loop. That loop sends each line typed on stdin and prints each
//! message as `[HH:MM:SS] sender: text`. The server echoes a sender's own
//! messages back, so typed lines show up in the transcript once relayed.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Login handshake, sending, the receive task and the interactive loop.
//!
//! ### Display Module (`display`)
//! Received message type and its terminal formatting.
//!
//! ### Error Module (`error`)
//! Client-side error type.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:8888", "alice", "pw1").await?;
//!     client.send("hello everyone").await?;
//!
//!     while let Some(message) = client.recv().await {
//!         println!("{}", message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod display;
pub mod error;
pub mod network;
