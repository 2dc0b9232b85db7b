//! Startup configuration loaded from a JSON file
//!
//! The file holds the listen address and the user table:
//!
//! ```json
//! {
//!     "server": { "host": "127.0.0.1", "port": 8888, "send_timeout_ms": 5000 },
//!     "auth": { "alice": "pw1", "bob": "pw2" }
//! }
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub server: ListenConfig,
    pub auth: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Upper bound for handing one message to one recipient
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_send_timeout_ms() -> u64 {
    5000
}

impl ServerConfig {
    /// Reads and validates the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;

        Self::parse(&contents, &display)
    }

    fn parse(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig =
            serde_json::from_str(contents).map_err(|source| ConfigError::Malformed {
                path: origin.to_string(),
                source,
            })?;

        if config.auth.is_empty() {
            return Err(ConfigError::NoUsers(origin.to_string()));
        }
        if config.server.send_timeout_ms == 0 {
            return Err(ConfigError::ZeroSendTimeout);
        }

        Ok(config)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.server.send_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    const VALID: &str = r#"{
        "server": { "port": 9000 },
        "auth": { "alice": "pw1", "bob": "pw2" }
    }"#;

    #[test]
    fn test_parse_applies_defaults() {
        let config = ServerConfig::parse(VALID, "inline").unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.send_timeout(), Duration::from_millis(5000));
        assert_eq!(config.listen_address(), "127.0.0.1:9000");
        assert_eq!(config.auth.len(), 2);
        assert_eq!(config.auth.get("alice").map(String::as_str), Some("pw1"));
    }

    #[test]
    fn test_parse_explicit_values() {
        let contents = r#"{
            "server": { "host": "0.0.0.0", "port": 8888, "send_timeout_ms": 250 },
            "auth": { "carol": "secret" }
        }"#;
        let config = ServerConfig::parse(contents, "inline").unwrap();

        assert_eq!(config.listen_address(), "0.0.0.0:8888");
        assert_eq!(config.send_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_parse_rejects_missing_port() {
        let contents = r#"{ "server": {}, "auth": { "alice": "pw1" } }"#;
        let result = ServerConfig::parse(contents, "inline");
        assert!(matches!(result, Err(ConfigError::Malformed { .. })));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result = ServerConfig::parse("[Auth]\nalice = pw1", "inline");
        assert!(matches!(result, Err(ConfigError::Malformed { .. })));
    }

    #[test]
    fn test_parse_rejects_empty_user_table() {
        let contents = r#"{ "server": { "port": 8888 }, "auth": {} }"#;
        let result = ServerConfig::parse(contents, "inline");
        assert!(matches!(result, Err(ConfigError::NoUsers(_))));
    }

    #[test]
    fn test_parse_rejects_zero_send_timeout() {
        let contents = r#"{
            "server": { "port": 8888, "send_timeout_ms": 0 },
            "auth": { "alice": "pw1" }
        }"#;
        let result = ServerConfig::parse(contents, "inline");
        assert!(matches!(result, Err(ConfigError::ZeroSendTimeout)));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ServerConfig::load("/nonexistent/chat-relay/config.json");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("chat-relay-config-{}.json", nanos));
        fs::write(&path, VALID).unwrap();

        let config = ServerConfig::load(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(config.unwrap().server.port, 9000);
    }
}
