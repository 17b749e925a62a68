//! Service-specific tests
//!
//! Each real service implementation has its own test file. Nothing here
//! needs a container runtime.


// Common test utilities for services
pub mod common {
    use std::collections::HashMap;

    use crate::service::{Instance, ReadinessSpec};

    /// Instance whose named ports all point at `endpoint`
    pub fn instance_at(name: &str, ports: &[&str], endpoint: &str) -> Instance {
        let external: HashMap<String, String> = ports
            .iter()
            .map(|p| (p.to_string(), endpoint.to_string()))
            .collect();
        Instance {
            name: name.to_string(),
            container: format!("demo-{name}"),
            internal: HashMap::new(),
            external,
            readiness: None,
            metrics_port: None,
        }
    }

    pub fn with_readiness(mut instance: Instance, readiness: ReadinessSpec) -> Instance {
        instance.readiness = Some(readiness);
        instance
    }
}
