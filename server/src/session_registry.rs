//! Registry of live sessions, keyed by user identifier
//!
//! This module is the single source of truth for who is online:
//! - Registration after a successful login, replacing any earlier login
//! - Removal when a connection ends or a delivery to it fails
//! - Point-in-time snapshots for broadcasting
//!
//! One lock guards the map. It is only held for in-memory inserts, removals
//! and copies; sending to a sink always happens on a snapshot, outside it.

use log::{info, warn};
use shared::Packet;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};

/// Sending half of a connection's outbound queue
pub type Sink = mpsc::Sender<Packet>;

/// The binding between an authenticated user and its outbound sink
#[derive(Debug, Clone)]
pub struct Session {
    /// User identifier the connection logged in as
    pub user: String,
    /// Registry-assigned identity, distinguishes successive logins of one user
    pub id: u64,
    /// Outbound queue drained by the connection's writer task
    pub sink: Sink,
}

#[derive(Debug)]
struct Sessions {
    by_user: HashMap<String, Session>,
    next_session_id: u64,
}

/// Concurrent map of user identifier to live session.
///
/// At most one session per user exists at any time. Every operation takes
/// `&self` and none of them can fail.
#[derive(Debug)]
pub struct SessionRegistry {
    inner: RwLock<Sessions>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Sessions {
                by_user: HashMap::new(),
                next_session_id: 1,
            }),
        }
    }

    /// Inserts a session for `user`, displacing any existing one.
    ///
    /// Returns the newly registered session. The displaced session, if any,
    /// stops receiving broadcasts immediately.
    pub async fn register(&self, user: &str, sink: Sink) -> Session {
        let mut sessions = self.inner.write().await;

        let id = sessions.next_session_id;
        sessions.next_session_id += 1;

        let session = Session {
            user: user.to_string(),
            id,
            sink,
        };

        if let Some(displaced) = sessions.by_user.insert(user.to_string(), session.clone()) {
            warn!(
                "User {} logged in again, displacing session {}",
                user, displaced.id
            );
        }
        info!("User {} registered as session {}", user, id);

        session
    }

    /// Removes the session for `user` if present. Returns whether anything
    /// was removed; a second call is a no-op.
    pub async fn unregister(&self, user: &str) -> bool {
        let removed = self.inner.write().await.by_user.remove(user);
        if let Some(session) = &removed {
            info!("User {} unregistered (session {})", user, session.id);
        }
        removed.is_some()
    }

    /// Removes `session` only if it is still the registered one for its user.
    ///
    /// A connection that was displaced by a newer login must not remove its
    /// replacement when it closes.
    pub async fn unregister_session(&self, session: &Session) -> bool {
        let mut sessions = self.inner.write().await;
        if Self::is_current(&sessions, session) {
            sessions.by_user.remove(&session.user);
            info!(
                "User {} unregistered (session {})",
                session.user, session.id
            );
            true
        } else {
            false
        }
    }

    /// Removes the session for `user` after a failed delivery.
    pub async fn evict(&self, user: &str) -> bool {
        let removed = self.inner.write().await.by_user.remove(user);
        if let Some(session) = &removed {
            warn!("Evicted user {} (session {})", user, session.id);
        }
        removed.is_some()
    }

    /// Evicts a batch of sessions under a single lock acquisition.
    ///
    /// Sessions that were already removed or replaced since the caller saw
    /// them are left alone. Returns the number actually evicted.
    pub async fn evict_sessions(&self, failed: &[Session]) -> usize {
        if failed.is_empty() {
            return 0;
        }

        let mut sessions = self.inner.write().await;
        let mut evicted = 0;
        for session in failed {
            if Self::is_current(&sessions, session) {
                sessions.by_user.remove(&session.user);
                warn!("Evicted user {} (session {})", session.user, session.id);
                evicted += 1;
            }
        }
        evicted
    }

    /// Copies every live session at a single point in time.
    pub async fn snapshot(&self) -> Vec<Session> {
        self.inner.read().await.by_user.values().cloned().collect()
    }

    pub async fn contains(&self, user: &str) -> bool {
        self.inner.read().await.by_user.contains_key(user)
    }

    /// Whether this exact session is still the one registered for its user.
    pub async fn is_registered(&self, session: &Session) -> bool {
        Self::is_current(&*self.inner.read().await, session)
    }

    /// Online user identifiers in sorted order
    pub async fn online_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.inner.read().await.by_user.keys().cloned().collect();
        users.sort();
        users
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_user.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_user.is_empty()
    }

    fn is_current(sessions: &Sessions, session: &Session) -> bool {
        sessions
            .by_user
            .get(&session.user)
            .is_some_and(|current| current.id == session.id)
    }
}
