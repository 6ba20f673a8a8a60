use std::str::FromStr;

use folga_core::DEFAULT_MAX_CONSECUTIVE_WORKING_DAYS;
use serde::{Deserialize, Serialize};

pub const ENV_DATABASE_URL: &str = "FOLGA_DATABASE_URL";
pub const ENV_MAX_CONNECTIONS: &str = "FOLGA_MAX_CONNECTIONS";
pub const ENV_MAX_WORKING_DAYS: &str = "FOLGA_MAX_WORKING_DAYS";

/// Store settings. Every field falls back to its default when the matching
/// environment variable is missing or unparsable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Used for new schedules created without an explicit limit.
    #[serde(default = "default_max_working_days")]
    pub default_max_consecutive_working_days: u32,
}

fn default_database_url() -> String {
    "sqlite://folga.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_max_working_days() -> u32 {
    DEFAULT_MAX_CONSECUTIVE_WORKING_DAYS
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            default_max_consecutive_working_days: default_max_working_days(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: parse_env(ENV_DATABASE_URL).unwrap_or_else(default_database_url),
            max_connections: parse_env(ENV_MAX_CONNECTIONS)
                .filter(|n| *n > 0)
                .unwrap_or_else(default_max_connections),
            default_max_consecutive_working_days: parse_env(ENV_MAX_WORKING_DAYS)
                .filter(|n| *n > 0)
                .unwrap_or_else(default_max_working_days),
        }
    }

    /// In-memory database, mostly for tests. A single connection keeps every
    /// query on the same database.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.database_url, "sqlite://folga.db");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.default_max_consecutive_working_days, 6);
    }

    #[test]
    fn missing_fields_take_defaults_when_deserializing() {
        let config: StoreConfig = serde_json::from_str(r#"{"maxConnections": 2}"#).unwrap();
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.database_url, "sqlite://folga.db");
        assert_eq!(config.default_max_consecutive_working_days, 6);
    }
}
