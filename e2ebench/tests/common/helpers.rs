//! Recording mocks and harness assembly for scenario tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use e2ebench::runtime::MockLinkOpener;
use e2ebench::{Harness, InteractiveVerifier};
use orchestrator::traits::{MockProcessLauncher, MockReadinessProbe};
use orchestrator::{
    Backoff, Instance, LaunchRequest, Orchestrator, OrchestratorError, OrchestratorResult,
    ProcessLauncher, RealFileSystem, ToolRun,
};

use super::fixtures::TestFixtures;

/// Ordered record of calls made into the mocks
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

/// Launcher whose second pipeline writes part of its output and never finishes
#[derive(Default)]
pub struct StallingLauncher {
    pub calls: AtomicUsize,
}

impl StallingLauncher {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ProcessLauncher for StallingLauncher {
    async fn create_network(&self, _network: &str) -> OrchestratorResult<()> {
        Err(OrchestratorError::launcher("docker network create", "not supported"))
    }

    async fn remove_network(&self, _network: &str) -> OrchestratorResult<()> {
        Err(OrchestratorError::launcher("docker network rm", "not supported"))
    }

    async fn spawn(&self, _request: &LaunchRequest) -> OrchestratorResult<Instance> {
        Err(OrchestratorError::launcher("docker run", "not supported"))
    }

    async fn stop(&self, _instance: &Instance) -> OrchestratorResult<()> {
        Err(OrchestratorError::launcher("docker stop", "not supported"))
    }

    async fn run_pipeline(&self, stages: &[ToolRun]) -> OrchestratorResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let (host_dir, _) = &stages[1].volumes[0];
        TestFixtures::block_tree(host_dir, 1);
        if call == 1 {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

pub struct TestHelpers;

impl TestHelpers {
    /// Launcher mock that "starts" every service and records spawns and stops
    pub fn recording_launcher(log: &EventLog) -> MockProcessLauncher {
        let mut launcher = MockProcessLauncher::new();

        launcher.expect_create_network().returning(|_| Ok(()));
        let network_log = log.clone();
        launcher.expect_remove_network().returning(move |network| {
            network_log.push(format!("network-rm:{network}"));
            Ok(())
        });

        let spawn_log = log.clone();
        launcher.expect_spawn().returning(move |request| {
            spawn_log.push(format!("spawn:{}", request.spec.name));
            let mut internal = HashMap::new();
            let mut external = HashMap::new();
            for (offset, port) in request.spec.ports.iter().enumerate() {
                internal.insert(port.name.clone(), format!("{}:{}", request.hostname, port.number));
                external.insert(port.name.clone(), format!("127.0.0.1:{}", 40000 + offset));
            }
            Ok(Instance {
                name: request.spec.name.clone(),
                container: request.hostname.clone(),
                internal,
                external,
                readiness: request.spec.readiness.clone(),
                metrics_port: request.spec.metrics_port.clone(),
            })
        });

        let stop_log = log.clone();
        launcher.expect_stop().returning(move |instance| {
            stop_log.push(format!("stop:{}", instance.name));
            Ok(())
        });

        launcher.expect_run_pipeline().times(0);
        launcher
    }

    /// Probe mock: every service is ready, the querier reports `connections`
    pub fn probe(connections: u32) -> MockReadinessProbe {
        let mut probe = MockReadinessProbe::new();
        probe.expect_is_ready().returning(|_| Ok(true));
        probe
            .expect_scrape_metrics()
            .returning(move |_| Ok(TestFixtures::querier_exposition(connections)));
        probe
    }

    /// Harness over mocks and the real file system, polling without sleeps
    pub fn harness(launcher: MockProcessLauncher, probe: MockReadinessProbe, opener: MockLinkOpener) -> Harness {
        Self::harness_with_backoff(launcher, probe, opener, Backoff::immediate(3))
    }

    /// Harness whose readiness and metric polling follow `backoff`
    pub fn harness_with_backoff(
        launcher: MockProcessLauncher,
        probe: MockReadinessProbe,
        opener: MockLinkOpener,
        backoff: Backoff,
    ) -> Harness {
        Harness {
            launcher: Arc::new(launcher),
            fs: Arc::new(RealFileSystem::new()),
            orchestrator: Orchestrator::new(probe)
                .with_readiness_backoff(backoff)
                .with_metric_backoff(backoff),
            verifier: InteractiveVerifier::new(opener),
        }
    }

    /// Opener mock recording the links it was asked to open
    pub fn opener(links: &EventLog) -> MockLinkOpener {
        let links = links.clone();
        let mut opener = MockLinkOpener::new();
        opener.expect_open().returning(move |link| {
            links.push(link.to_string());
            Ok(())
        });
        opener
    }
}
