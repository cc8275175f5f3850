//! Sandbox configuration types
//!
//! Configuration for the container runtime that hosts lab sandboxes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Which client talks to the container runtime
    #[serde(default)]
    pub runtime: SandboxRuntime,
    /// Lab image started for every attempt
    #[serde(default = "default_image")]
    pub image: String,
    /// Bridge network every lab container is attached to
    #[serde(default = "default_network")]
    pub network: String,
    /// Memory ceiling (e.g. "128m", "1g")
    #[serde(default = "default_memory")]
    pub memory_limit: String,
    /// Docker binary used by the CLI runtime
    #[serde(default = "default_docker_binary")]
    pub docker_binary: String,
    /// Upper bound on a single create call
    #[serde(default = "default_create_timeout", with = "humantime_serde")]
    pub create_timeout: Duration,
    /// Upper bound on a single destroy call
    #[serde(default = "default_destroy_timeout", with = "humantime_serde")]
    pub destroy_timeout: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            runtime: SandboxRuntime::default(),
            image: default_image(),
            network: default_network(),
            memory_limit: default_memory(),
            docker_binary: default_docker_binary(),
            create_timeout: default_create_timeout(),
            destroy_timeout: default_destroy_timeout(),
        }
    }
}

fn default_image() -> String {
    "net_explorerlearning-node".to_string()
}

fn default_network() -> String {
    "net-explorer-lab".to_string()
}

fn default_memory() -> String {
    "128m".to_string()
}

fn default_docker_binary() -> String {
    "docker".to_string()
}

fn default_create_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_destroy_timeout() -> Duration {
    Duration::from_secs(15)
}

/// Sandbox runtime client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxRuntime {
    /// Docker Engine API over the local socket
    #[default]
    Docker,
    /// Shell out to the docker CLI
    Cli,
}

impl std::str::FromStr for SandboxRuntime {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docker" | "api" | "engine" => Ok(SandboxRuntime::Docker),
            "cli" | "shell" => Ok(SandboxRuntime::Cli),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid sandbox runtime: {}. Valid: docker, cli",
                s
            ))),
        }
    }
}

impl std::fmt::Display for SandboxRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxRuntime::Docker => write!(f, "docker"),
            SandboxRuntime::Cli => write!(f, "cli"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_parsing() {
        assert_eq!(
            "docker".parse::<SandboxRuntime>().unwrap(),
            SandboxRuntime::Docker
        );
        assert_eq!("CLI".parse::<SandboxRuntime>().unwrap(), SandboxRuntime::Cli);
        assert!("podman".parse::<SandboxRuntime>().is_err());
    }

    #[test]
    fn test_sandbox_config_default() {
        let config = SandboxConfig::default();
        assert_eq!(config.runtime, SandboxRuntime::Docker);
        assert_eq!(config.memory_limit, "128m");
        assert_eq!(config.create_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_humantime_durations() {
        let config: SandboxConfig =
            toml::from_str("create_timeout = \"2m\"\ndestroy_timeout = \"500ms\"\n").unwrap();
        assert_eq!(config.create_timeout, Duration::from_secs(120));
        assert_eq!(config.destroy_timeout, Duration::from_millis(500));
    }
}
