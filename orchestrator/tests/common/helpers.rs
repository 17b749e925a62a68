//! Test helpers and builder patterns for orchestrator tests
//!
//! Mock launchers and probes share an [`EventLog`] so tests can assert on the
//! interleaving of spawns, readiness checks and stops.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use orchestrator::traits::{MockProcessLauncher, MockReadinessProbe};
use orchestrator::{Backoff, Environment, Orchestrator, OrchestratorError, ProcessLauncher};

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

    pub fn position(&self, event: &str) -> usize {
        self.events()
            .iter()
            .position(|e| e == event)
            .unwrap_or_else(|| panic!("event {event} not recorded in {:?}", self.events()))
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

/// Builder for a launcher mock that records network, spawn and stop calls
pub struct LauncherBuilder {
    log: EventLog,
    fail_spawn: Option<String>,
    fail_stop: Option<String>,
}

impl LauncherBuilder {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail_spawn: None,
            fail_stop: None,
        }
    }

    pub fn failing_spawn(mut self, service: &str) -> Self {
        self.fail_spawn = Some(service.to_string());
        self
    }

    pub fn failing_stop(mut self, service: &str) -> Self {
        self.fail_stop = Some(service.to_string());
        self
    }

    pub fn build(self) -> MockProcessLauncher {
        let mut launcher = MockProcessLauncher::new();

        let log = self.log.clone();
        launcher.expect_create_network().returning(move |network| {
            log.push(format!("network:{network}"));
            Ok(())
        });

        let log = self.log.clone();
        launcher.expect_remove_network().returning(move |network| {
            log.push(format!("network-rm:{network}"));
            Ok(())
        });

        let log = self.log.clone();
        let fail_spawn = self.fail_spawn;
        launcher.expect_spawn().returning(move |request| {
            if fail_spawn.as_deref() == Some(request.spec.name.as_str()) {
                return Err(OrchestratorError::launcher("docker run", "image not found"));
            }
            log.push(format!("spawn:{}", request.spec.name));
            Ok(TestFixtures::instance_for(request))
        });

        let log = self.log.clone();
        let fail_stop = self.fail_stop;
        launcher.expect_stop().returning(move |instance| {
            log.push(format!("stop:{}", instance.name));
            if fail_stop.as_deref() == Some(instance.name.as_str()) {
                return Err(OrchestratorError::launcher("docker stop", "no such container"));
            }
            Ok(())
        });

        launcher.expect_run_pipeline().times(0);
        launcher
    }
}

/// Builder for a readiness probe mock
pub struct ProbeBuilder {
    log: EventLog,
    scrapes: Vec<String>,
    never_ready: Option<String>,
}

impl ProbeBuilder {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            scrapes: Vec::new(),
            never_ready: None,
        }
    }

    /// Successive scrape results; the last one repeats
    pub fn scrapes<I: IntoIterator<Item = String>>(mut self, scrapes: I) -> Self {
        self.scrapes = scrapes.into_iter().collect();
        self
    }

    pub fn never_ready(mut self, service: &str) -> Self {
        self.never_ready = Some(service.to_string());
        self
    }

    pub fn build(self) -> (MockReadinessProbe, Arc<AtomicUsize>) {
        let mut probe = MockReadinessProbe::new();

        let log = self.log.clone();
        let never_ready = self.never_ready;
        probe.expect_is_ready().returning(move |instance| {
            if never_ready.as_deref() == Some(instance.name.as_str()) {
                return Ok(false);
            }
            log.push(format!("ready:{}", instance.name));
            Ok(true)
        });

        let scrape_count = Arc::new(AtomicUsize::new(0));
        let counter = scrape_count.clone();
        let scrapes = self.scrapes;
        probe.expect_scrape_metrics().returning(move |_| {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            let index = call.min(scrapes.len().saturating_sub(1));
            Ok(scrapes.get(index).cloned().unwrap_or_default())
        });

        (probe, scrape_count)
    }
}

/// Common test helper functions
pub struct TestHelpers;

impl TestHelpers {
    /// Environment declaring `services` with the fixture service shape
    pub fn environment(launcher: MockProcessLauncher, services: &[&str]) -> Environment {
        let launcher: Arc<dyn ProcessLauncher> = Arc::new(launcher);
        let mut env = Environment::new(TestFixtures::ENV_NAME, TestFixtures::SHARED_DIR, launcher);
        for name in services {
            env.add_service(TestFixtures::service(name)).unwrap();
        }
        env
    }

    /// Orchestrator that retries without sleeping
    pub fn fast_orchestrator(probe: MockReadinessProbe, attempts: u32) -> Orchestrator {
        Orchestrator::new(probe)
            .with_readiness_backoff(Backoff::immediate(attempts))
            .with_metric_backoff(Backoff::immediate(attempts))
    }
}
