//! Benchmark Configuration Builder
//!
//! Provides a flexible builder pattern for constructing harness configurations

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::BenchConfig;

pub struct BenchConfigBuilder {
    config: BenchConfig,
}

impl BenchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: BenchConfig::default(),
        }
    }

    /// Set fixture cache root
    pub fn data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the directory the environment's shared dir is created in
    pub fn work_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    /// Set environment (and network) name
    pub fn env_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.env_name = name.into();
        self
    }

    /// Set fixture generator image
    pub fn bench_image<S: Into<String>>(mut self, image: S) -> Self {
        self.config.bench_image = image.into();
        self
    }

    /// Set block plan profile
    pub fn profile<S: Into<String>>(mut self, profile: S) -> Self {
        self.config.profile = profile.into();
        self
    }

    pub fn thanos_image<S: Into<String>>(mut self, image: S) -> Self {
        self.config.thanos_image = image.into();
        self
    }

    pub fn prometheus_image<S: Into<String>>(mut self, image: S) -> Self {
        self.config.prometheus_image = image.into();
        self
    }

    pub fn minio_image<S: Into<String>>(mut self, image: S) -> Self {
        self.config.minio_image = image.into();
        self
    }

    /// Set fixture max times (long-term, scrape sources)
    pub fn max_times(mut self, old: DateTime<Utc>, fresh: DateTime<Utc>) -> Self {
        self.config.max_time_old = old;
        self.config.max_time_fresh = fresh;
        self
    }

    /// Set how many blocks the partial replica receives
    pub fn partial_blocks(mut self, count: usize) -> Self {
        self.config.partial_blocks = count;
        self
    }

    /// Set completion endpoint port
    pub fn verify_port(mut self, port: u16) -> Self {
        self.config.verify_port = port;
        self
    }

    /// Open the deep link in a browser (default) or only print it
    pub fn open_browser(mut self, open: bool) -> Self {
        self.config.open_browser = open;
        self
    }

    /// Set log level (trace, debug, info, warn, error)
    pub fn log_level<S: Into<String>>(mut self, level: S) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Use a different docker-compatible CLI
    pub fn docker_binary<S: Into<String>>(mut self, binary: S) -> Self {
        self.config.docker_binary = binary.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> BenchConfig {
        self.config
    }
}

impl Default for BenchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
