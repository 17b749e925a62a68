//! Test fixtures and data for orchestrator tests

use std::collections::HashMap;

use orchestrator::{Instance, LaunchRequest, ReadinessSpec, ServiceSpec};
use shared::PortSpec;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const ENV_NAME: &'static str = "demo";
    pub const SHARED_DIR: &'static str = "/tmp/e2e_demo";
    pub const CONNECTIONS_METRIC: &'static str = "thanos_store_nodes_grpc_connections";

    /// A thanos-like service with http and grpc ports
    pub fn service(name: &str) -> ServiceSpec {
        ServiceSpec::new(name, "thanos:latest")
            .port(PortSpec::http(8080))
            .port(PortSpec::grpc(9091))
            .readiness(ReadinessSpec::http("http", "/-/ready"))
            .metrics_on("http")
    }

    /// What a launcher would report for `request`, with deterministic host ports
    pub fn instance_for(request: &LaunchRequest) -> Instance {
        let internal: HashMap<String, String> = request
            .spec
            .ports
            .iter()
            .map(|p| (p.name.clone(), format!("{}:{}", request.hostname, p.number)))
            .collect();
        let external = request
            .spec
            .ports
            .iter()
            .map(|p| (p.name.clone(), format!("127.0.0.1:{}", 30000 + p.number)))
            .collect();

        Instance {
            name: request.spec.name.clone(),
            container: request.hostname.clone(),
            internal,
            external,
            readiness: request.spec.readiness.clone(),
            metrics_port: request.spec.metrics_port.clone(),
        }
    }

    /// Querier exposition with `connections` store connections, or without the metric
    pub fn querier_exposition(connections: Option<u32>) -> String {
        let mut text = String::from(
            "# HELP go_goroutines Number of goroutines.\n\
             # TYPE go_goroutines gauge\n\
             go_goroutines 42\n",
        );
        if let Some(count) = connections {
            text.push_str(&format!(
                "# TYPE {metric} gauge\n{metric}{{store_type=\"sidecar\"}} {sidecars}\n{metric}{{store_type=\"store\"}} {stores}\n",
                metric = Self::CONNECTIONS_METRIC,
                sidecars = count.min(2),
                stores = count.saturating_sub(2),
            ));
        }
        text
    }
}
