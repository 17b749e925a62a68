//! Environment: an ordered set of services and the instances started from it
//!
//! The environment owns every instance it starts. `close` stops them in
//! reverse start order and removes the network; it is idempotent, so callers
//! can route every exit path through [`Environment::close_with`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shared::{service_debug, service_info, service_warn};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::service::{CONTAINER_SHARED_DIR, Instance, LaunchRequest, ServiceSpec};
use crate::traits::ProcessLauncher;

pub struct Environment {
    name: String,
    shared_dir: PathBuf,
    services: Vec<ServiceSpec>,
    /// Started instances, in start order
    instances: Vec<Instance>,
    launcher: Arc<dyn ProcessLauncher>,
    network_created: bool,
    closed: bool,
}

impl Environment {
    /// Declare an environment. Nothing is created until a service is started.
    pub fn new<S: Into<String>, P: Into<PathBuf>>(
        name: S,
        shared_dir: P,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Self {
        Self {
            name: name.into(),
            shared_dir: shared_dir.into(),
            services: Vec::new(),
            instances: Vec::new(),
            launcher,
            network_created: false,
            closed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Host directory mounted into every container
    pub fn shared_dir(&self) -> &Path {
        &self.shared_dir
    }

    /// Add a service declaration. Names are unique within an environment.
    pub fn add_service(&mut self, spec: ServiceSpec) -> OrchestratorResult<()> {
        if self.services.iter().any(|s| s.name == spec.name) {
            return Err(OrchestratorError::DuplicateService {
                name: spec.name,
                environment: self.name.clone(),
            });
        }
        service_debug!(spec.name, "📝 Declared service ({})", spec.image);
        self.services.push(spec);
        Ok(())
    }

    pub fn services(&self) -> &[ServiceSpec] {
        &self.services
    }

    pub fn service(&self, name: &str) -> OrchestratorResult<&ServiceSpec> {
        self.services
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| OrchestratorError::UnknownService {
                name: name.to_string(),
            })
    }

    /// Hostname of a service on the internal network
    pub fn hostname(&self, service: &str) -> String {
        format!("{}-{}", self.name, service)
    }

    /// Host-side directory owned by a service
    pub fn service_dir(&self, service: &str) -> PathBuf {
        self.shared_dir.join("data").join(service)
    }

    /// The same directory as seen from inside any container
    pub fn container_dir(&self, service: &str) -> String {
        format!("{CONTAINER_SHARED_DIR}/data/{service}")
    }

    /// `hostname:port` of a declared port, resolvable before the service runs
    pub fn internal_endpoint(&self, service: &str, port: &str) -> OrchestratorResult<String> {
        let spec = self.service(service)?;
        let port_spec = spec
            .find_port(port)
            .ok_or_else(|| OrchestratorError::UnknownPort {
                service: service.to_string(),
                port: port.to_string(),
            })?;
        Ok(format!("{}:{}", self.hostname(service), port_spec.number))
    }

    /// Start a declared service. Starting an already running service is a no-op.
    pub async fn start_service(&mut self, name: &str) -> OrchestratorResult<&Instance> {
        if let Some(index) = self.instances.iter().position(|i| i.name == name) {
            service_debug!(name, "Already running, not starting again");
            return Ok(&self.instances[index]);
        }

        let spec = self.service(name)?.clone();

        if !self.network_created {
            self.launcher.create_network(&self.name).await?;
            self.network_created = true;
        }
        self.closed = false;

        let request = LaunchRequest {
            network: self.name.clone(),
            hostname: self.hostname(name),
            shared_dir: self.shared_dir.clone(),
            spec,
        };
        let instance = self.launcher.spawn(&request).await?;
        service_info!(name, "🚀 Started ({})", instance.container);

        self.instances.push(instance);
        Ok(&self.instances[self.instances.len() - 1])
    }

    pub fn instance(&self, name: &str) -> OrchestratorResult<&Instance> {
        self.instances
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| OrchestratorError::NotStarted {
                name: name.to_string(),
            })
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stop every started instance (last started first) and remove the network.
    ///
    /// Every instance is attempted even if an earlier stop fails; the first
    /// error is returned. Calling it again after it returned is a no-op.
    pub async fn close(&mut self) -> OrchestratorResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut first_error = None;
        while let Some(instance) = self.instances.pop() {
            match self.launcher.stop(&instance).await {
                Ok(()) => {
                    service_info!(instance.name, "🛑 Stopped");
                }
                Err(e) => {
                    service_warn!(instance.name, "⚠️ Failed to stop: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if self.network_created {
            self.network_created = false;
            if let Err(e) = self.launcher.remove_network(&self.name).await {
                service_warn!(self.name, "⚠️ Failed to remove network: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Close the environment and merge the outcome with the caller's result.
    ///
    /// The caller's error wins; a teardown error is only surfaced when the
    /// body itself succeeded.
    pub async fn close_with<T, E>(mut self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<OrchestratorError>,
    {
        let teardown = self.close().await;
        match (result, teardown) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(teardown_error)) => {
                service_warn!(self.name, "⚠️ Teardown after failure also failed: {}", teardown_error);
                Err(e)
            }
        }
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        if self.closed || (self.instances.is_empty() && !self.network_created) {
            return;
        }

        // Emergency cleanup: an environment dropped without close()
        service_warn!(
            self.name,
            "🚨 Dropped without close, stopping {} instance(s) in the background",
            self.instances.len()
        );
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            service_warn!(self.name, "🚨 No runtime available, instances left running");
            return;
        };

        let launcher = self.launcher.clone();
        let network = self.network_created.then(|| self.name.clone());
        let instances = std::mem::take(&mut self.instances);
        self.closed = true;

        handle.spawn(async move {
            for instance in instances.iter().rev() {
                let _ = launcher.stop(instance).await;
            }
            if let Some(network) = network {
                let _ = launcher.remove_network(&network).await;
            }
        });
    }
}
