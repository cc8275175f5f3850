//! Storage configuration types
//!
//! Configuration for the report object store and the session store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Report store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Object store backend
    #[serde(default)]
    pub backend: StorageBackendType,
    /// Root directory for the filesystem backend
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Upper bound on a single put or list call
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: StorageBackendType::default(),
            root: default_root(),
            timeout: default_timeout(),
        }
    }
}

fn default_root() -> PathBuf {
    crate::config::state_dir().join("reports-store")
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Object store backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendType {
    /// Files under `root`, one per key
    #[default]
    Filesystem,
    /// In-memory (no persistence)
    Memory,
}

impl std::str::FromStr for StorageBackendType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "filesystem" | "fs" | "file" => Ok(StorageBackendType::Filesystem),
            "memory" | "mem" => Ok(StorageBackendType::Memory),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid storage backend: {}. Valid: filesystem, memory",
                s
            ))),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions untouched for this long are evicted and their sandbox reaped
    #[serde(default = "default_idle_timeout", with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// Maximum number of live sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            idle_timeout: default_idle_timeout(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_max_sessions() -> u64 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!(
            "fs".parse::<StorageBackendType>().unwrap(),
            StorageBackendType::Filesystem
        );
        assert_eq!(
            "memory".parse::<StorageBackendType>().unwrap(),
            StorageBackendType::Memory
        );
        assert!("s3".parse::<StorageBackendType>().is_err());
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(1800));
        assert_eq!(config.max_sessions, 10_000);
    }
}
