//! Readiness gates and the staged startup plan they belong to

use std::fmt;

/// Comparison a numeric signal must satisfy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Equals(f64),
    Greater(f64),
    GreaterOrEqual(f64),
    Less(f64),
    LessOrEqual(f64),
}

impl Comparison {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Comparison::Equals(target) => value == target,
            Comparison::Greater(target) => value > target,
            Comparison::GreaterOrEqual(target) => value >= target,
            Comparison::Less(target) => value < target,
            Comparison::LessOrEqual(target) => value <= target,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Equals(t) => write!(f, "== {t}"),
            Comparison::Greater(t) => write!(f, "> {t}"),
            Comparison::GreaterOrEqual(t) => write!(f, ">= {t}"),
            Comparison::Less(t) => write!(f, "< {t}"),
            Comparison::LessOrEqual(t) => write!(f, "<= {t}"),
        }
    }
}

/// How a metric gate treats metrics the instance does not report yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricWaitOptions {
    /// Count missing metrics as zero and keep polling instead of failing
    pub wait_missing: bool,
}

impl MetricWaitOptions {
    pub fn wait_missing() -> Self {
        Self { wait_missing: true }
    }
}

/// A blocking precondition checked after a stage's services are started
#[derive(Debug, Clone, PartialEq)]
pub enum ReadinessGate {
    AcceptsConnections {
        service: String,
    },
    Metric {
        service: String,
        metrics: Vec<String>,
        comparison: Comparison,
        options: MetricWaitOptions,
    },
}

impl ReadinessGate {
    pub fn accepts_connections(service: &str) -> Self {
        Self::AcceptsConnections {
            service: service.to_string(),
        }
    }

    pub fn metric(
        service: &str,
        metrics: &[&str],
        comparison: Comparison,
        options: MetricWaitOptions,
    ) -> Self {
        Self::Metric {
            service: service.to_string(),
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            comparison,
            options,
        }
    }

    pub fn service(&self) -> &str {
        match self {
            Self::AcceptsConnections { service } | Self::Metric { service, .. } => service,
        }
    }
}

impl fmt::Display for ReadinessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptsConnections { service } => write!(f, "{service} accepts connections"),
            Self::Metric {
                service,
                metrics,
                comparison,
                ..
            } => write!(f, "{service} sum({}) {comparison}", metrics.join(", ")),
        }
    }
}

/// Services started together, then gated before the next stage begins
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stage {
    pub services: Vec<String>,
    pub gates: Vec<ReadinessGate>,
}

/// Ordered startup stages. Every started service is implicitly awaited for
/// readiness; `gates` add conditions on top of that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupPlan {
    stages: Vec<Stage>,
}

impl StartupPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage<I, S>(self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gated_stage(services, Vec::new())
    }

    pub fn gated_stage<I, S>(mut self, services: I, gates: Vec<ReadinessGate>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages.push(Stage {
            services: services.into_iter().map(Into::into).collect(),
            gates,
        });
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Position of the stage that starts `service`
    pub fn stage_of(&self, service: &str) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| stage.services.iter().any(|s| s == service))
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.stages
            .iter()
            .flat_map(|stage| stage.services.iter().map(String::as_str))
    }
}
