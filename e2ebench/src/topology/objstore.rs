//! Configuration documents handed to services
//!
//! Rendered with `shared::render_document`; both Prometheus and Thanos read
//! them as YAML.

use serde::Serialize;
use shared::Labels;

/// Object store client configuration for Thanos components
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketConfig {
    #[serde(rename = "type")]
    pub kind: ObjstoreKind,
    pub config: S3Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjstoreKind {
    S3,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub insecure: bool,
}

impl BucketConfig {
    /// Plain-HTTP S3 bucket
    pub fn s3(bucket: &str, endpoint: &str, access_key: &str, secret_key: &str) -> Self {
        Self {
            kind: ObjstoreKind::S3,
            config: S3Config {
                bucket: bucket.to_string(),
                endpoint: endpoint.to_string(),
                access_key: access_key.to_string(),
                secret_key: secret_key.to_string(),
                insecure: true,
            },
        }
    }
}

/// The slice of prometheus.yml the harness controls
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrometheusConfig {
    pub global: GlobalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalConfig {
    pub external_labels: Labels,
}

impl PrometheusConfig {
    pub fn with_external_labels(labels: Labels) -> Self {
        Self {
            global: GlobalConfig {
                external_labels: labels,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bucket_config_shape() {
        let config = BucketConfig::s3("bkt1", "demo-minio-1:8090", "Cheescake", "supersecret");
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "S3",
                "config": {
                    "bucket": "bkt1",
                    "endpoint": "demo-minio-1:8090",
                    "access_key": "Cheescake",
                    "secret_key": "supersecret",
                    "insecure": true
                }
            })
        );
    }

    #[test]
    fn test_prometheus_external_labels() {
        let labels = Labels::from_pairs(&[("cluster", "eu-1"), ("replica", "1")]).unwrap();
        let value = serde_json::to_value(PrometheusConfig::with_external_labels(labels)).unwrap();
        assert_eq!(
            value,
            json!({ "global": { "external_labels": { "cluster": "eu-1", "replica": "1" } } })
        );
    }
}
