//! HTTP readiness and metrics probe
//!
//! Talks to services over their published host ports.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::service::{Instance, ReadinessSpec};
use crate::traits::ReadinessProbe;
use shared::service_debug;

/// Per-request timeout; the surrounding gate owns the overall deadline
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct HttpReadinessProbe {
    client: reqwest::Client,
}

impl HttpReadinessProbe {
    pub fn new() -> OrchestratorResult<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client })
    }

    fn endpoint<'a>(instance: &'a Instance, port: &str) -> OrchestratorResult<&'a str> {
        instance
            .endpoint(port)
            .ok_or_else(|| OrchestratorError::UnknownPort {
                service: instance.name.clone(),
                port: port.to_string(),
            })
    }
}

#[async_trait]
impl ReadinessProbe for HttpReadinessProbe {
    async fn is_ready(&self, instance: &Instance) -> OrchestratorResult<bool> {
        let Some(readiness) = &instance.readiness else {
            // Nothing to probe, running is as ready as it gets
            return Ok(true);
        };
        let endpoint = Self::endpoint(instance, readiness.port())?;

        match readiness {
            ReadinessSpec::Tcp { .. } => Ok(TcpStream::connect(endpoint).await.is_ok()),
            ReadinessSpec::Http { path, .. } => {
                let url = format!("http://{endpoint}{path}");
                match self.client.get(&url).send().await {
                    Ok(response) => {
                        let ready = response.status().is_success();
                        if !ready {
                            service_debug!(instance.name, "{} answered {}", url, response.status());
                        }
                        Ok(ready)
                    }
                    Err(e) => {
                        service_debug!(instance.name, "{} not reachable yet: {}", url, e);
                        Ok(false)
                    }
                }
            }
        }
    }

    async fn scrape_metrics(&self, instance: &Instance) -> OrchestratorResult<String> {
        let port = instance
            .metrics_port
            .as_deref()
            .ok_or_else(|| OrchestratorError::MetricMissing {
                service: instance.name.clone(),
                metrics: Vec::new(),
            })?;
        let url = format!("http://{}/metrics", Self::endpoint(instance, port)?);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
