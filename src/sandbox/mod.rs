//! Sandbox module - Lab containers
//!
//! One lab attempt runs in one container. The rest of the crate only sees
//! the [`SandboxClient`] capability; two clients implement it:
//! - Docker mode: Docker Engine API over the local socket
//! - CLI mode: shells out to the `docker` binary

mod cli;
mod container;

pub use cli::CliSandbox;
pub use container::DockerSandbox;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{SandboxConfig, SandboxRuntime};
use crate::error::Result;

/// Opaque handle returned by the sandbox runtime
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    /// Wrap a runtime-issued identifier
    pub fn new(id: impl Into<String>) -> Self {
        ContainerId(id.into())
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability to create and forcibly destroy lab sandboxes
#[async_trait]
pub trait SandboxClient: Send + Sync {
    /// Client name for logs
    fn name(&self) -> &str;

    /// Launch a detached, memory-capped sandbox on the lab network
    async fn create(&self) -> Result<ContainerId>;

    /// Stop and delete a sandbox in one step.
    ///
    /// A sandbox that already exited is removed normally; one the runtime no
    /// longer knows about counts as destroyed.
    async fn destroy(&self, id: &ContainerId) -> Result<()>;
}

/// Create a sandbox client based on the configuration
pub async fn create_sandbox_client(config: &SandboxConfig) -> Result<Arc<dyn SandboxClient>> {
    match config.runtime {
        SandboxRuntime::Docker => {
            let client = DockerSandbox::connect(config).await?;
            Ok(Arc::new(client))
        }
        SandboxRuntime::Cli => {
            let client = CliSandbox::new(config)?;
            Ok(Arc::new(client))
        }
    }
}

/// Parse a memory limit string (e.g., "128m", "1g") to bytes
pub fn parse_memory_limit(limit: &str) -> Option<i64> {
    let limit = limit.trim().to_lowercase();
    let (num_str, multiplier) = if let Some(n) = strip_unit(&limit, 'g') {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = strip_unit(&limit, 'm') {
        (n, 1024 * 1024)
    } else if let Some(n) = strip_unit(&limit, 'k') {
        (n, 1024)
    } else {
        (limit.strip_suffix('b').unwrap_or(&limit), 1)
    };

    let num: i64 = num_str.parse().ok()?;
    if num <= 0 {
        return None;
    }
    num.checked_mul(multiplier)
}

fn strip_unit(limit: &str, unit: char) -> Option<&str> {
    limit
        .strip_suffix('b')
        .unwrap_or(limit)
        .strip_suffix(unit)
}
