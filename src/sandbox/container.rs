//! Docker Engine API sandbox client
//!
//! Talks to the local Docker daemon directly. Lab containers are created
//! detached with a memory ceiling and attached to the lab bridge network.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::Docker;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SandboxConfig;
use crate::error::{with_timeout, Error, Result};
use crate::sandbox::{parse_memory_limit, ContainerId, SandboxClient};

/// Label put on every lab container
const LAB_LABEL: &str = "netexplorer.lab";

/// Docker container sandbox client
pub struct DockerSandbox {
    /// Docker client
    docker: Docker,
    /// Lab image
    image: String,
    /// Lab bridge network
    network: String,
    /// Memory ceiling in bytes
    memory: i64,
    create_timeout: Duration,
    destroy_timeout: Duration,
}

impl DockerSandbox {
    /// Connect to the local Docker daemon
    pub async fn connect(config: &SandboxConfig) -> Result<Self> {
        let memory = parse_memory_limit(&config.memory_limit).ok_or_else(|| {
            Error::Config(format!("Invalid memory limit: {}", config.memory_limit))
        })?;

        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::Config(format!("Failed to connect to Docker: {}", e)))?;

        // Verify connection
        docker
            .ping()
            .await
            .map_err(|e| Error::Config(format!("Docker ping failed: {}", e)))?;

        info!(
            image = %config.image,
            network = %config.network,
            "Sandbox client connected to Docker"
        );

        Ok(DockerSandbox {
            docker,
            image: config.image.clone(),
            network: config.network.clone(),
            memory,
            create_timeout: config.create_timeout,
            destroy_timeout: config.destroy_timeout,
        })
    }

    /// Create and start one lab container.
    ///
    /// Each daemon call runs under the create deadline. Whatever was created
    /// before a failure or timeout is force-removed, by name if the daemon
    /// never answered with an id.
    async fn run_container(&self) -> Result<ContainerId> {
        let container_name = format!("netexplorer-lab-{}", uuid::Uuid::new_v4());

        let container_config = Config {
            image: Some(self.image.clone()),
            labels: Some(HashMap::from([(LAB_LABEL.to_string(), "1".to_string())])),
            host_config: Some(bollard::service::HostConfig {
                memory: Some(self.memory),
                network_mode: Some(self.network.clone()),
                auto_remove: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let create_options = CreateContainerOptions {
            name: container_name.as_str(),
            platform: None,
        };

        let created = with_timeout(self.create_timeout, "sandbox create", async {
            self.docker
                .create_container(Some(create_options), container_config)
                .await
                .map_err(|e| Error::SandboxCreateFailed(e.to_string()))
        })
        .await;

        let created = match created {
            Ok(created) => created,
            Err(e @ Error::Timeout(_)) => {
                self.discard(&container_name).await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        for warning in &created.warnings {
            warn!(container = %created.id, "Docker: {}", warning);
        }

        let started = with_timeout(self.create_timeout, "sandbox start", async {
            self.docker
                .start_container(&created.id, None::<StartContainerOptions<String>>)
                .await
                .map_err(|e| Error::SandboxCreateFailed(e.to_string()))
        })
        .await;

        if let Err(e) = started {
            // Never hand out a container that is not running; drop the husk.
            self.discard(&created.id).await;
            return Err(e);
        }

        debug!(container = %created.id, name = %container_name, "Started lab container");
        Ok(ContainerId::new(created.id))
    }

    /// Remove a container nobody will be told about
    async fn discard(&self, id: &str) {
        let removed = with_timeout(self.destroy_timeout, "sandbox cleanup", async {
            self.remove_container(id)
                .await
                .map_err(|e| Error::SandboxDestroyFailed {
                    container: id.to_string(),
                    message: e.to_string(),
                })
        })
        .await;

        if let Err(e) = removed {
            warn!(container = %id, "Failed to remove unstarted container: {}", e);
        }
    }

    /// Force-remove a container, treating "no such container" as done
    async fn remove_container(&self, id: &str) -> std::result::Result<(), DockerError> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        match self.docker.remove_container(id, Some(options)).await {
            Ok(()) => {
                debug!(container = %id, "Removed container");
                Ok(())
            }
            Err(DockerError::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                warn!(container = %id, "Container already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SandboxClient for DockerSandbox {
    fn name(&self) -> &str {
        "docker"
    }

    async fn create(&self) -> Result<ContainerId> {
        self.run_container().await
    }

    async fn destroy(&self, id: &ContainerId) -> Result<()> {
        with_timeout(self.destroy_timeout, "sandbox destroy", async {
            self.remove_container(id.as_str())
                .await
                .map_err(|e| Error::SandboxDestroyFailed {
                    container: id.to_string(),
                    message: e.to_string(),
                })
        })
        .await
    }
}
