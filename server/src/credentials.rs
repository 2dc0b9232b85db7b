//! Read-only user table consulted when a connection logs in

use crate::config::ServerConfig;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;

/// Maps user identifiers to their secrets.
///
/// Built once at startup and never mutated, so it can be shared between
/// connection tasks behind an `Arc` without a lock.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    /// Builds the store from the `auth` table of a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = ServerConfig::load(path)?;
        Ok(Self::from_config(&config))
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.auth.clone())
    }

    /// Returns true iff `user` exists and `secret` matches its stored secret.
    ///
    /// Unknown users and wrong secrets are indistinguishable to the caller.
    pub fn verify(&self, user: &str, secret: &str) -> bool {
        // Plain equality; a constant-time comparison would hide timing differences.
        matches!(self.users.get(user), Some(stored) if stored == secret)
    }

    /// Configured user identifiers in sorted order
    pub fn users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.users.keys().cloned().collect();
        users.sort();
        users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<U, S> FromIterator<(U, S)> for CredentialStore
where
    U: Into<String>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (U, S)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(user, secret)| (user.into(), secret.into()))
                .collect(),
        )
    }
}
