//! Test Scenarios
//!
//! Named runs of the harness, dispatched from the command line.

pub mod query_pushdown;

use std::sync::Arc;

use orchestrator::{
    DockerLauncher, FileSystem, HttpReadinessProbe, Orchestrator, ProcessLauncher, RealFileSystem,
};

use crate::config::BenchConfig;
use crate::error::{BenchError, BenchResult};
use crate::runtime::{BrowserOpener, EndpointHit, InteractiveVerifier, StdoutOpener};
use shared::service_warn;

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        service_warn!("scenarios", "⚠️ Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// The outside world a scenario runs against
pub struct Harness {
    pub launcher: Arc<dyn ProcessLauncher>,
    pub fs: Arc<dyn FileSystem>,
    pub orchestrator: Orchestrator,
    pub verifier: InteractiveVerifier,
}

impl Harness {
    /// Docker containers, the local disk and HTTP probes
    pub fn docker(config: &BenchConfig) -> BenchResult<Self> {
        let probe = HttpReadinessProbe::new().map_err(BenchError::Setup)?;
        let verifier = if config.open_browser {
            InteractiveVerifier::new(BrowserOpener)
        } else {
            InteractiveVerifier::new(StdoutOpener)
        };

        Ok(Self {
            launcher: Arc::new(DockerLauncher::new().with_binary(&config.docker_binary)),
            fs: Arc::new(RealFileSystem::new()),
            orchestrator: Orchestrator::new(probe),
            verifier,
        })
    }
}

pub struct TestScenarios {
    config: BenchConfig,
    harness: Harness,
}

impl TestScenarios {
    pub fn new(config: BenchConfig, harness: Harness) -> Self {
        Self { config, harness }
    }

    /// Run a specific scenario by name
    pub async fn run_scenario(&self, name: &str) -> BenchResult<()> {
        match name {
            // Full demo: ends when the completion endpoint is hit
            "query_pushdown" => {
                let mut hit = EndpointHit::bind(self.config.verify_port).await?;
                query_pushdown::run(&self.config, &self.harness, hit.wait(), ctrl_c()).await
            }

            // Bring the topology up, pass every gate, tear it down
            "smoke" => {
                query_pushdown::run(&self.config, &self.harness, std::future::ready(Ok(())), ctrl_c()).await
            }

            // Only make sure the fixture cache is populated
            "fixtures" => query_pushdown::fixtures(&self.config, &self.harness, ctrl_c())
                .await
                .map(|_| ()),

            _ => Err(BenchError::configuration(
                "scenario",
                format!(
                    "Unknown scenario '{}'. Available: {}",
                    name,
                    Self::available_scenarios().join(", ")
                ),
            )),
        }
    }

    /// Get list of available scenarios
    pub fn available_scenarios() -> Vec<&'static str> {
        vec!["query_pushdown", "smoke", "fixtures"]
    }
}
