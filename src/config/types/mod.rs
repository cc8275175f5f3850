//! Configuration types module
//!
//! Top-level configuration plus the lab, server, auth and logging sections.
//! Sandbox and storage settings live in their own submodules.

pub mod sandbox;
pub mod storage;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Exercise definition
    #[serde(default)]
    pub lab: LabConfig,

    /// Sandbox runtime configuration
    #[serde(default)]
    pub sandbox: sandbox::SandboxConfig,

    /// Report store configuration
    #[serde(default)]
    pub storage: storage::StorageConfig,

    /// Session store configuration
    #[serde(default)]
    pub session: storage::SessionConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Whether the server only listens on the local machine
    pub fn is_loopback(&self) -> bool {
        match self.bind.parse::<std::net::IpAddr>() {
            Ok(ip) => ip.is_loopback(),
            Err(_) => self.bind.eq_ignore_ascii_case("localhost"),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

/// The exercise served by this lab
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabConfig {
    /// The only answer accepted by the validator
    #[serde(default = "default_expected_subnet_mask")]
    pub expected_subnet_mask: String,
    /// Topology recorded in completion reports
    #[serde(default = "default_topology")]
    pub topology: String,
    /// Score recorded for a completed lab
    #[serde(default = "default_success_score")]
    pub success_score: i64,
}

impl Default for LabConfig {
    fn default() -> Self {
        LabConfig {
            expected_subnet_mask: default_expected_subnet_mask(),
            topology: default_topology(),
            success_score: default_success_score(),
        }
    }
}

fn default_expected_subnet_mask() -> String {
    "255.255.255.0".to_string()
}

fn default_topology() -> String {
    "192.168.1.0/24".to_string()
}

fn default_success_score() -> i64 {
    100
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// User id to login token. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub tokens: HashMap<String, SecretString>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info,netexplorer=debug".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.lab.expected_subnet_mask, "255.255.255.0");
        assert_eq!(config.lab.topology, "192.168.1.0/24");
        assert_eq!(config.lab.success_score, 100);
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn test_loopback_detection() {
        let mut server = ServerConfig::default();
        assert!(server.is_loopback());

        for bind in ["localhost", "::1", "127.0.0.2"] {
            server.bind = bind.to_string();
            assert!(server.is_loopback(), "{}", bind);
        }
        for bind in ["0.0.0.0", "10.0.0.5", "lab.example.org"] {
            server.bind = bind.to_string();
            assert!(!server.is_loopback(), "{}", bind);
        }
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.sandbox.memory_limit, "128m");
    }
}
