//! Fan-out of one chat message to every registered session

use crate::error::DeliveryError;
use crate::session_registry::{Session, SessionRegistry};
use log::{debug, warn};
use shared::{ChatMessage, Packet};
use std::time::Duration;
use tokio::sync::mpsc::error::SendTimeoutError;

/// Outcome of a single broadcast pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of sinks that accepted the message
    pub delivered: usize,
    /// Users evicted because their sink failed
    pub evicted: Vec<String>,
}

/// Delivers `message` to every session registered at the time of the call,
/// including the sender's own.
///
/// The registry lock is only taken to snapshot and, afterwards, to evict.
/// Each send is bounded by `send_timeout`; a failed or timed-out recipient
/// does not stop delivery to the others and is evicted once the pass ends.
pub async fn broadcast(
    registry: &SessionRegistry,
    message: &ChatMessage,
    send_timeout: Duration,
) -> BroadcastReport {
    let sessions = registry.snapshot().await;
    let packet = Packet::Message(message.clone());

    let mut report = BroadcastReport::default();
    let mut failed: Vec<Session> = Vec::new();

    for session in sessions {
        debug!(
            "Sending message from {} to {}",
            message.sender, session.user
        );
        match deliver(&session, packet.clone(), send_timeout).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!("Failed to send message to user {}: {}", session.user, e);
                failed.push(session);
            }
        }
    }

    if !failed.is_empty() {
        registry.evict_sessions(&failed).await;
        report.evicted = failed.into_iter().map(|s| s.user).collect();
        report.evicted.sort();
    }

    report
}

async fn deliver(
    session: &Session,
    packet: Packet,
    send_timeout: Duration,
) -> Result<(), DeliveryError> {
    session
        .sink
        .send_timeout(packet, send_timeout)
        .await
        .map_err(|e| match e {
            SendTimeoutError::Closed(_) => DeliveryError::Closed,
            SendTimeoutError::Timeout(_) => DeliveryError::TimedOut(send_timeout),
        })
}
