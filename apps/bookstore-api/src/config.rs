//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use bookstore_db::DbConfig;
use serde::{Deserialize, Serialize};

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Bearer token lifetime in seconds
    pub session_ttl_secs: i64,

    /// Upper bound on pooled database connections
    pub db_max_connections: u32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = ApiConfig {
            bind_addr: read("BOOKSTORE_BIND_ADDR", "127.0.0.1:5001")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BOOKSTORE_BIND_ADDR".to_string()))?,

            database_path: PathBuf::from(read("BOOKSTORE_DB_PATH", "./bookstore.db")),

            session_ttl_secs: read("BOOKSTORE_SESSION_TTL_SECS", "86400") // 24 hours
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BOOKSTORE_SESSION_TTL_SECS".to_string()))?,

            db_max_connections: read("BOOKSTORE_DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BOOKSTORE_DB_MAX_CONNECTIONS".to_string()))?,
        };

        if config.session_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("BOOKSTORE_SESSION_TTL_SECS".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("BOOKSTORE_DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Session lifetime as a chrono duration.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs)
    }

    /// Database pool settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:5001".parse().unwrap());
        assert_eq!(config.database_path, PathBuf::from("./bookstore.db"));
        assert_eq!(config.session_ttl_secs, 86400);
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("BOOKSTORE_BIND_ADDR", "0.0.0.0:8080"),
            ("BOOKSTORE_DB_PATH", "/tmp/shop.db"),
            ("BOOKSTORE_SESSION_TTL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.session_ttl(), chrono::Duration::seconds(60));
        assert_eq!(config.db_config().database_path, PathBuf::from("/tmp/shop.db"));
    }

    #[test]
    fn test_invalid_values() {
        let err = ApiConfig::from_lookup(lookup(&[("BOOKSTORE_BIND_ADDR", "not-an-addr")]))
            .unwrap_err();
        assert!(err.to_string().contains("BOOKSTORE_BIND_ADDR"));

        assert!(ApiConfig::from_lookup(lookup(&[("BOOKSTORE_SESSION_TTL_SECS", "0")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("BOOKSTORE_DB_MAX_CONNECTIONS", "x")])).is_err());
    }
}
