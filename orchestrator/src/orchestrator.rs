//! Dependency-ordered startup with blocking readiness gates
//!
//! The orchestrator walks a [`StartupPlan`] stage by stage: it starts every
//! service of the stage, waits until all of them pass their readiness check,
//! then evaluates the stage's extra gates before moving on. Teardown is not
//! its business; a failed `start` leaves the environment for the caller to
//! close.

use futures_util::future::try_join_all;

use shared::{logging, service_debug, service_info, service_warn};

use crate::core::{Backoff, Comparison, MetricWaitOptions, ReadinessGate, StartupPlan, sum_samples};
use crate::environment::Environment;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::service::Instance;
use crate::traits::ReadinessProbe;

pub struct Orchestrator {
    probe: Box<dyn ReadinessProbe>,
    readiness_backoff: Backoff,
    metric_backoff: Backoff,
}

impl Orchestrator {
    pub fn new(probe: impl ReadinessProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
            readiness_backoff: Backoff::readiness(),
            metric_backoff: Backoff::metrics(),
        }
    }

    /// Configure the readiness polling schedule (fluent API)
    pub fn with_readiness_backoff(mut self, backoff: Backoff) -> Self {
        self.readiness_backoff = backoff;
        self
    }

    /// Configure the metric gate polling schedule (fluent API)
    pub fn with_metric_backoff(mut self, backoff: Backoff) -> Self {
        self.metric_backoff = backoff;
        self
    }

    /// Start every stage of `plan` in order, blocking on readiness and gates.
    ///
    /// Any failure is reported as [`OrchestratorError::Startup`] naming the
    /// service at fault; instances started so far keep running.
    pub async fn start(&self, env: &mut Environment, plan: &StartupPlan) -> OrchestratorResult<()> {
        for (index, stage) in plan.stages().iter().enumerate() {
            logging::log_progress(
                env.name(),
                &format!("Stage {}/{}", index + 1, plan.stages().len()),
                &stage.services.join(", "),
            );

            for name in &stage.services {
                env.start_service(name)
                    .await
                    .map_err(|e| OrchestratorError::startup(name, e))?;
            }

            let instances = stage
                .services
                .iter()
                .map(|name| env.instance(name))
                .collect::<OrchestratorResult<Vec<_>>>()?;
            self.wait_ready(&instances).await.map_err(into_startup)?;

            for gate in &stage.gates {
                self.check_gate(env, gate).await.map_err(into_startup)?;
            }
        }

        logging::log_success(env.name(), "All stages ready");
        Ok(())
    }

    /// Wait until every instance passes its readiness check.
    pub async fn wait_ready(&self, instances: &[&Instance]) -> OrchestratorResult<()> {
        try_join_all(instances.iter().map(|instance| self.wait_instance_ready(instance))).await?;
        Ok(())
    }

    /// Wait until the summed value of `metrics` on `instance` satisfies `comparison`.
    pub async fn wait_metric(
        &self,
        instance: &Instance,
        metrics: &[String],
        comparison: Comparison,
        options: MetricWaitOptions,
    ) -> OrchestratorResult<()> {
        let mut attempts = self.metric_backoff.start();
        loop {
            match self.probe.scrape_metrics(instance).await {
                Ok(exposition) => {
                    let sums: Vec<Option<f64>> =
                        metrics.iter().map(|m| sum_samples(&exposition, m)).collect();
                    let missing: Vec<String> = metrics
                        .iter()
                        .zip(&sums)
                        .filter(|(_, sum)| sum.is_none())
                        .map(|(name, _)| name.clone())
                        .collect();

                    if !missing.is_empty() && !options.wait_missing {
                        return Err(OrchestratorError::MetricMissing {
                            service: instance.name.clone(),
                            metrics: missing,
                        });
                    }

                    let value: f64 = sums.iter().map(|s| s.unwrap_or(0.0)).sum();
                    if comparison.matches(value) {
                        service_info!(instance.name, "✅ Metric gate satisfied: {} = {}", metrics.join("+"), value);
                        return Ok(());
                    }
                    service_debug!(
                        instance.name,
                        "Metric gate pending: {} = {} (want {}, missing {:?})",
                        metrics.join("+"),
                        value,
                        comparison,
                        missing
                    );
                }
                Err(e) => {
                    service_debug!(instance.name, "Metric scrape failed: {}", e);
                }
            }

            if !attempts.wait().await {
                return Err(OrchestratorError::GateTimeout {
                    service: instance.name.clone(),
                    gate: format!("sum({}) {}", metrics.join(", "), comparison),
                    attempts: attempts.made(),
                });
            }
        }
    }

    async fn check_gate(&self, env: &Environment, gate: &ReadinessGate) -> OrchestratorResult<()> {
        let instance = env.instance(gate.service())?;
        service_debug!(instance.name, "Checking gate: {}", gate);

        match gate {
            ReadinessGate::AcceptsConnections { .. } => self.wait_instance_ready(instance).await,
            ReadinessGate::Metric {
                metrics,
                comparison,
                options,
                ..
            } => self.wait_metric(instance, metrics, *comparison, *options).await,
        }
    }

    async fn wait_instance_ready(&self, instance: &Instance) -> OrchestratorResult<()> {
        let mut attempts = self.readiness_backoff.start();
        loop {
            match self.probe.is_ready(instance).await {
                Ok(true) => {
                    service_info!(instance.name, "✅ Ready after {} attempt(s)", attempts.made());
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => {
                    service_warn!(instance.name, "⚠️ Readiness probe error: {}", e);
                }
            }

            if !attempts.wait().await {
                return Err(OrchestratorError::GateTimeout {
                    service: instance.name.clone(),
                    gate: "readiness".to_string(),
                    attempts: attempts.made(),
                });
            }
        }
    }
}

/// Gate failures surface as startup failures of the service they guard.
fn into_startup(error: OrchestratorError) -> OrchestratorError {
    match error {
        OrchestratorError::GateTimeout { ref service, .. }
        | OrchestratorError::MetricMissing { ref service, .. } => {
            OrchestratorError::startup(service, &error)
        }
        other => other,
    }
}
