//! Benchmark Configuration
//!
//! Everything a run needs to know: where fixtures are cached, which images to
//! use and how the final verification step behaves.

use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;

use crate::error::{BenchError, BenchResult};

#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Fixture cache root
    pub data_dir: PathBuf,
    /// Parent of the environment's shared directory
    pub work_dir: PathBuf,
    pub env_name: String,
    pub bench_image: String,
    /// Block plan profile passed to the generator
    pub profile: String,
    pub thanos_image: String,
    pub prometheus_image: String,
    pub minio_image: String,
    /// Max time of the long-term (object store) fixtures
    pub max_time_old: DateTime<Utc>,
    /// Max time of the scrape source fixtures
    pub max_time_fresh: DateTime<Utc>,
    /// Blocks the partial HA replica receives
    pub partial_blocks: usize,
    /// Port of the completion endpoint, 0 picks a free one
    pub verify_port: u16,
    pub open_browser: bool,
    pub log_level: String,
    pub docker_binary: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            work_dir: PathBuf::from("."),
            env_name: "query_pushdown_demo".to_string(),
            bench_image: "quay.io/thanos/thanosbench:v0.2.0-rc.1".to_string(),
            profile: "continuous-1w-small".to_string(),
            thanos_image: "thanos:latest".to_string(),
            prometheus_image: "quay.io/prometheus/prometheus:v2.27.0".to_string(),
            minio_image: "minio/minio:RELEASE.2021-07-27T02-40-15Z".to_string(),
            max_time_old: utc_midnight(2021, 7, 20),
            max_time_fresh: utc_midnight(2021, 7, 27),
            partial_blocks: 5,
            verify_port: 0,
            open_browser: true,
            log_level: "info".to_string(),
            docker_binary: "docker".to_string(),
        }
    }
}

impl BenchConfig {
    /// Create a new builder
    pub fn builder() -> crate::config::builder::BenchConfigBuilder {
        crate::config::builder::BenchConfigBuilder::new()
    }

    /// Shared directory mounted into every container of the environment
    pub fn env_dir(&self) -> PathBuf {
        self.work_dir.join(format!("e2e_{}", self.env_name))
    }

    /// Check if this configuration is usable
    pub fn validate(&self) -> BenchResult<()> {
        if self.env_name.is_empty()
            || !self
                .env_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(BenchError::configuration(
                "env_name",
                format!("'{}' is not a valid container network name", self.env_name),
            ));
        }
        if self.partial_blocks == 0 {
            return Err(BenchError::configuration("partial_blocks", "must be at least 1"));
        }
        if self.max_time_old >= self.max_time_fresh {
            return Err(BenchError::configuration(
                "max_time_old",
                "long-term fixtures must end before the scrape source fixtures",
            ));
        }
        Ok(())
    }
}

fn utc_midnight(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}
