//! Docker-backed process launcher
//!
//! Shells out to the `docker` CLI. Services run detached on a per-environment
//! bridge network with every declared port published on an ephemeral host
//! port; one-shot tools run attached and are chained through pipes.

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::service::{CONTAINER_SHARED_DIR, Instance, LaunchRequest, ToolRun};
use crate::traits::ProcessLauncher;
use shared::{service_debug, service_warn};

/// Seconds `docker stop` waits before killing a container
const STOP_TIMEOUT_SECS: u32 = 10;

pub struct DockerLauncher {
    binary: String,
    /// `uid:gid` containers run as, so files they write stay removable
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PortBinding {
    #[serde(rename = "HostPort")]
    host_port: String,
}

impl DockerLauncher {
    pub fn new() -> Self {
        Self {
            binary: "docker".to_string(),
            user: current_user(),
        }
    }

    /// Use a different docker-compatible CLI, e.g. `podman` (fluent API)
    pub fn with_binary<S: Into<String>>(mut self, binary: S) -> Self {
        self.binary = binary.into();
        self
    }

    /// Run containers as the image's default user (fluent API)
    pub fn without_user_mapping(mut self) -> Self {
        self.user = None;
        self
    }

    /// Build `docker run` arguments for a detached service
    pub fn run_args(&self, request: &LaunchRequest) -> Vec<String> {
        let spec = &request.spec;
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--detach".to_string(),
            "--name".to_string(),
            request.hostname.clone(),
            "--hostname".to_string(),
            request.hostname.clone(),
            "--network".to_string(),
            request.network.clone(),
            "--volume".to_string(),
            format!("{}:{CONTAINER_SHARED_DIR}:z", request.shared_dir.display()),
        ];

        if let Some(user) = &self.user {
            args.push("--user".to_string());
            args.push(user.clone());
        }
        for (key, value) in &spec.env {
            args.push("--env".to_string());
            args.push(format!("{key}={value}"));
        }
        for port in &spec.ports {
            args.push("--publish".to_string());
            args.push(format!("127.0.0.1::{}", port.number));
        }
        if let Some(entrypoint) = &spec.entrypoint {
            args.push("--entrypoint".to_string());
            args.push(entrypoint.clone());
        }

        args.push(spec.image.clone());
        args.extend(spec.args.iter().cloned());
        args
    }

    /// Build `docker run` arguments for one attached pipeline stage
    pub fn tool_args(&self, run: &ToolRun) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string(), "--interactive".to_string()];
        if let Some(user) = &self.user {
            args.push("--user".to_string());
            args.push(user.clone());
        }
        for (host, container) in &run.volumes {
            args.push("--volume".to_string());
            args.push(format!("{}:{container}:z", host.display()));
        }
        args.push(run.image.clone());
        args.extend(run.args.iter().cloned());
        args
    }

    /// Run a docker command to completion and return its stdout
    async fn docker(&self, args: &[String]) -> OrchestratorResult<String> {
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| OrchestratorError::launcher(self.describe(args), e.to_string()))?;

        if !output.status.success() {
            return Err(OrchestratorError::launcher(
                self.describe(args),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// Host endpoints for every published port of a running container
    async fn published_ports(&self, request: &LaunchRequest) -> OrchestratorResult<HashMap<String, String>> {
        let raw = self
            .docker(&[
                "inspect".to_string(),
                "--format".to_string(),
                "{{json .NetworkSettings.Ports}}".to_string(),
                request.hostname.clone(),
            ])
            .await?;
        let bindings: HashMap<String, Option<Vec<PortBinding>>> = serde_json::from_str(&raw)?;

        let mut external = HashMap::new();
        for port in &request.spec.ports {
            let key = format!("{}/tcp", port.number);
            let host_port = bindings
                .get(&key)
                .and_then(|b| b.as_ref())
                .and_then(|b| b.first())
                .map(|b| b.host_port.clone())
                .ok_or_else(|| {
                    OrchestratorError::startup(&request.spec.name, format!("port {key} was not published"))
                })?;
            external.insert(port.name.clone(), format!("127.0.0.1:{host_port}"));
        }
        Ok(external)
    }

    /// Remove containers left on the network by an earlier, crashed run
    async fn remove_stale_containers(&self, network: &str) -> OrchestratorResult<()> {
        let stale = self
            .docker(&[
                "ps".to_string(),
                "--all".to_string(),
                "--quiet".to_string(),
                "--filter".to_string(),
                format!("network={network}"),
            ])
            .await?;

        for container in stale.lines().filter(|l| !l.trim().is_empty()) {
            service_warn!(network, "🧹 Removing stale container {}", container);
            self.docker(&["rm".to_string(), "--force".to_string(), container.to_string()])
                .await?;
        }
        Ok(())
    }
}

impl Default for DockerLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessLauncher for DockerLauncher {
    async fn create_network(&self, network: &str) -> OrchestratorResult<()> {
        let existing = self
            .docker(&[
                "network".to_string(),
                "ls".to_string(),
                "--quiet".to_string(),
                "--filter".to_string(),
                format!("name=^{network}$"),
            ])
            .await?;

        if !existing.is_empty() {
            self.remove_stale_containers(network).await?;
            self.docker(&["network".to_string(), "rm".to_string(), network.to_string()])
                .await?;
        }

        self.docker(&[
            "network".to_string(),
            "create".to_string(),
            "--driver".to_string(),
            "bridge".to_string(),
            network.to_string(),
        ])
        .await?;
        service_debug!(network, "🌐 Created network");
        Ok(())
    }

    async fn remove_network(&self, network: &str) -> OrchestratorResult<()> {
        self.docker(&["network".to_string(), "rm".to_string(), network.to_string()])
            .await?;
        Ok(())
    }

    async fn spawn(&self, request: &LaunchRequest) -> OrchestratorResult<Instance> {
        let container = self.docker(&self.run_args(request)).await?;
        service_debug!(request.spec.name, "Container id {}", container);

        let external = match self.published_ports(request).await {
            Ok(external) => external,
            Err(e) => {
                // Don't leak a container we cannot reach
                let _ = self
                    .docker(&["rm".to_string(), "--force".to_string(), request.hostname.clone()])
                    .await;
                return Err(e);
            }
        };

        let internal = request
            .spec
            .ports
            .iter()
            .map(|p| (p.name.clone(), format!("{}:{}", request.hostname, p.number)))
            .collect();

        Ok(Instance {
            name: request.spec.name.clone(),
            container: request.hostname.clone(),
            internal,
            external,
            readiness: request.spec.readiness.clone(),
            metrics_port: request.spec.metrics_port.clone(),
        })
    }

    async fn stop(&self, instance: &Instance) -> OrchestratorResult<()> {
        self.docker(&[
            "stop".to_string(),
            "--time".to_string(),
            STOP_TIMEOUT_SECS.to_string(),
            instance.container.clone(),
        ])
        .await?;
        Ok(())
    }

    async fn run_pipeline(&self, stages: &[ToolRun]) -> OrchestratorResult<()> {
        let mut children = Vec::with_capacity(stages.len());
        let mut upstream: Option<Stdio> = None;

        for (index, stage) in stages.iter().enumerate() {
            let args = self.tool_args(stage);
            let mut child = Command::new(&self.binary)
                .args(&args)
                .stdin(upstream.take().unwrap_or_else(Stdio::null))
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| OrchestratorError::launcher(self.describe(&args), e.to_string()))?;

            if index + 1 < stages.len() {
                let stdout = child.stdout.take().ok_or_else(|| {
                    OrchestratorError::launcher(self.describe(&args), "stdout was not captured")
                })?;
                upstream = Some(stdout.try_into()?);
            }
            children.push((self.describe(&args), child));
        }

        // All stages are drained concurrently so no stage blocks on a full pipe
        let outputs = try_join_all(children.into_iter().map(|(command, child)| async move {
            child
                .wait_with_output()
                .await
                .map(|output| (command, output))
                .map_err(OrchestratorError::from)
        }))
        .await?;

        for (command, output) in outputs {
            if !output.status.success() {
                let mut message = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if message.is_empty() {
                    message = format!("exited with {}", output.status);
                }
                return Err(OrchestratorError::launcher(command, message));
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn current_user() -> Option<String> {
    use nix::unistd::{getgid, getuid};
    Some(format!("{}:{}", getuid(), getgid()))
}

#[cfg(not(unix))]
fn current_user() -> Option<String> {
    None
}
