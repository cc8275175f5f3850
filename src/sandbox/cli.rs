//! Docker CLI sandbox client
//!
//! Shells out to `docker run -d` / `docker rm -f`. Useful where the Engine
//! socket is not reachable but a configured docker binary is.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::SandboxConfig;
use crate::error::{with_timeout, Error, Result};
use crate::sandbox::{parse_memory_limit, ContainerId, SandboxClient};

/// CLI-driven sandbox client
pub struct CliSandbox {
    /// Resolved docker binary
    binary: PathBuf,
    image: String,
    network: String,
    memory_limit: String,
    create_timeout: Duration,
    destroy_timeout: Duration,
}

impl CliSandbox {
    /// Resolve the docker binary and capture the lab settings
    pub fn new(config: &SandboxConfig) -> Result<Self> {
        if parse_memory_limit(&config.memory_limit).is_none() {
            return Err(Error::Config(format!(
                "Invalid memory limit: {}",
                config.memory_limit
            )));
        }

        let binary = which::which(&config.docker_binary).map_err(|e| {
            Error::Config(format!(
                "Docker binary '{}' not found: {}",
                config.docker_binary, e
            ))
        })?;

        debug!(binary = %binary.display(), "Using docker CLI for sandboxes");

        Ok(CliSandbox {
            binary,
            image: config.image.clone(),
            network: config.network.clone(),
            memory_limit: config.memory_limit.clone(),
            create_timeout: config.create_timeout,
            destroy_timeout: config.destroy_timeout,
        })
    }

    fn run_args(&self, name: &str) -> Vec<String> {
        vec![
            "run".to_string(),
            "-d".to_string(),
            format!("--name={}", name),
            format!("--memory={}", self.memory_limit),
            format!("--network={}", self.network),
            "--label=netexplorer.lab=1".to_string(),
            self.image.clone(),
        ]
    }

    async fn docker(&self, args: &[String]) -> std::io::Result<Output> {
        Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
    }

    /// `docker rm -f`, treating "No such container" as done
    async fn remove(&self, target: &str) -> Result<()> {
        let args = ["rm".to_string(), "-f".to_string(), target.to_string()];
        let output = self
            .docker(&args)
            .await
            .map_err(|e| Error::SandboxDestroyFailed {
                container: target.to_string(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            debug!(container = %target, "Removed container");
            return Ok(());
        }

        let message = diagnostic(&output);
        if message.contains("No such container") {
            warn!(container = %target, "Container already gone");
            return Ok(());
        }

        Err(Error::SandboxDestroyFailed {
            container: target.to_string(),
            message,
        })
    }
}

/// Combined stderr + stdout, the way the CLI reports its own failures
fn diagnostic(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = format!("{}{}", stderr, stdout).trim().to_string();
    if text.is_empty() {
        format!("docker exited with {}", output.status)
    } else {
        text
    }
}

#[async_trait]
impl SandboxClient for CliSandbox {
    fn name(&self) -> &str {
        "docker-cli"
    }

    /// Start a named container.
    ///
    /// Killing `docker run` on timeout does not stop the daemon from going
    /// on to create the container, so a timed-out create removes it by name.
    async fn create(&self) -> Result<ContainerId> {
        let name = format!("netexplorer-lab-{}", uuid::Uuid::new_v4());

        let created = with_timeout(self.create_timeout, "sandbox create", async {
            let output = self
                .docker(&self.run_args(&name))
                .await
                .map_err(|e| Error::SandboxCreateFailed(e.to_string()))?;

            if !output.status.success() {
                return Err(Error::SandboxCreateFailed(diagnostic(&output)));
            }

            let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if id.is_empty() {
                return Err(Error::SandboxCreateFailed(
                    "docker run printed no container id".to_string(),
                ));
            }
            Ok(ContainerId::new(id))
        })
        .await;

        match created {
            Ok(id) => {
                debug!(container = %id, name = %name, "Started lab container");
                Ok(id)
            }
            Err(e @ Error::Timeout(_)) => {
                let cleanup =
                    with_timeout(self.destroy_timeout, "sandbox cleanup", self.remove(&name)).await;
                if let Err(cleanup) = cleanup {
                    warn!(container = %name, "Failed to remove timed-out container: {}", cleanup);
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn destroy(&self, id: &ContainerId) -> Result<()> {
        with_timeout(self.destroy_timeout, "sandbox destroy", self.remove(id.as_str())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// A fake docker binary: prints `stdout`, writes `stderr`, exits `code`
    #[cfg(unix)]
    fn fake_docker(dir: &std::path::Path, stdout: &str, stderr: &str, code: i32) -> SandboxConfig {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("docker");
        let script = format!(
            "#!/bin/sh\nprintf '%s' '{}'\nprintf '%s' '{}' >&2\nexit {}\n",
            stdout, stderr, code
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        SandboxConfig {
            docker_binary: path.display().to_string(),
            ..SandboxConfig::default()
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_args_carry_limits() {
        let dir = tempdir().unwrap();
        let config = fake_docker(dir.path(), "", "", 0);
        let client = CliSandbox::new(&config).unwrap();

        let args = client.run_args("netexplorer-lab-test");
        assert_eq!(&args[..3], ["run", "-d", "--name=netexplorer-lab-test"]);
        assert!(args.contains(&"--memory=128m".to_string()));
        assert!(args.contains(&"--network=net-explorer-lab".to_string()));
        assert_eq!(args.last().unwrap(), "net_explorerlearning-node");
    }

    #[test]
    fn test_missing_binary_is_config_error() {
        let config = SandboxConfig {
            docker_binary: "/nonexistent/docker-binary".to_string(),
            ..SandboxConfig::default()
        };
        assert!(matches!(CliSandbox::new(&config), Err(Error::Config(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_create_returns_trimmed_id() {
        let dir = tempdir().unwrap();
        let client = CliSandbox::new(&fake_docker(dir.path(), "deadbeef\n", "", 0)).unwrap();

        let id = client.create().await.unwrap();
        assert_eq!(id.as_str(), "deadbeef");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_create_failure_surfaces_runtime_text() {
        let dir = tempdir().unwrap();
        let client =
            CliSandbox::new(&fake_docker(dir.path(), "", "Unable to find image", 125)).unwrap();

        match client.create().await {
            Err(Error::SandboxCreateFailed(msg)) => assert!(msg.contains("Unable to find image")),
            other => panic!("expected SandboxCreateFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_destroy_tolerates_missing_container() {
        let dir = tempdir().unwrap();
        let client = CliSandbox::new(&fake_docker(
            dir.path(),
            "",
            "Error response from daemon: No such container: abc",
            1,
        ))
        .unwrap();

        tokio_test::assert_ok!(client.destroy(&ContainerId::new("abc")).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_destroy_failure_is_reported() {
        let dir = tempdir().unwrap();
        let client =
            CliSandbox::new(&fake_docker(dir.path(), "", "permission denied", 1)).unwrap();

        let err = client.destroy(&ContainerId::new("abc")).await.unwrap_err();
        assert!(matches!(err, Error::SandboxDestroyFailed { ref container, .. } if container == "abc"));
    }

    /// A fake docker binary that records its arguments and hangs on `run`
    #[cfg(unix)]
    fn hanging_docker(dir: &std::path::Path) -> (SandboxConfig, std::path::PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let calls = dir.join("calls.log");
        let path = dir.join("docker");
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\nif [ \"$1\" = run ]; then sleep 5; fi\nexit 0\n",
            calls.display()
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = SandboxConfig {
            docker_binary: path.display().to_string(),
            create_timeout: Duration::from_millis(200),
            ..SandboxConfig::default()
        };
        (config, calls)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_create_timeout_removes_named_container() {
        let dir = tempdir().unwrap();
        let (config, calls) = hanging_docker(dir.path());
        let client = CliSandbox::new(&config).unwrap();

        let err = client.create().await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));

        let calls = std::fs::read_to_string(calls).unwrap();
        let lines: Vec<&str> = calls.lines().collect();
        assert_eq!(lines.len(), 2, "calls: {:?}", lines);

        let name = lines[0]
            .split_whitespace()
            .find_map(|arg| arg.strip_prefix("--name="))
            .unwrap();
        assert!(name.starts_with("netexplorer-lab-"));
        assert_eq!(lines[1], format!("rm -f {}", name));
    }
}
