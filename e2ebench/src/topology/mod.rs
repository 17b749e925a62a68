//! Query pushdown topology
//!
//! Declares the object store, store gateways, scrape sources with sidecars and
//! the querier on an [`Environment`], lays their fixtures and configuration
//! out on disk, and returns the startup plan. Nothing is started here.

pub mod catalog;
pub mod objstore;

use std::path::Path;

use orchestrator::{
    Comparison, Environment, FileSystem, MetricWaitOptions, ReadinessGate, ServiceSpec, StartupPlan,
};
use shared::{Labels, SharedResult, render_document, service_debug, service_info};

use crate::config::BenchConfig;
use crate::error::{BenchError, BenchResult};
use crate::runtime::FixturePaths;
use objstore::{BucketConfig, PrometheusConfig};

/// Querier metric counting established store API connections
pub const CONNECTIONS_METRIC: &str = "thanos_store_nodes_grpc_connections";

/// Which of a fixture's blocks a scrape source receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSelection {
    All,
    /// The last `n` block directories in name order
    Last(usize),
}

/// A bucket on the object store and the store gateway serving it
#[derive(Debug, Clone, PartialEq)]
pub struct BucketLayout {
    pub bucket: String,
    pub store: String,
    pub fixture: String,
}

/// A scrape source and the sidecar exposing it
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaLayout {
    pub prometheus: String,
    pub sidecar: String,
    pub fixture: String,
    pub blocks: BlockSelection,
    pub external_labels: Labels,
}

/// Names and data placement of every service, independent of any environment
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyLayout {
    pub object_store: String,
    pub default_bucket: String,
    pub buckets: Vec<BucketLayout>,
    pub replicas: Vec<ReplicaLayout>,
    pub querier: String,
}

impl TopologyLayout {
    /// Two long-term buckets, an HA pair with one partial replica, one
    /// independent source, and a querier over all of them
    pub fn query_pushdown(partial_blocks: usize) -> SharedResult<Self> {
        let bucket = |bucket: &str, store: &str, fixture: &str| BucketLayout {
            bucket: bucket.to_string(),
            store: store.to_string(),
            fixture: fixture.to_string(),
        };
        let replica = |prometheus: &str,
                       sidecar: &str,
                       fixture: &str,
                       blocks: BlockSelection,
                       labels: &[(&str, &str)]|
         -> SharedResult<ReplicaLayout> {
            Ok(ReplicaLayout {
                prometheus: prometheus.to_string(),
                sidecar: sidecar.to_string(),
                fixture: fixture.to_string(),
                blocks,
                external_labels: Labels::from_pairs(labels)?,
            })
        };

        Ok(Self {
            object_store: "minio-1".to_string(),
            default_bucket: "default".to_string(),
            buckets: vec![
                bucket("bkt1", "store1", "store1"),
                bucket("bkt2", "store2", "store2"),
            ],
            replicas: vec![
                replica(
                    "prom-ha0",
                    "sidecar-prom-ha0",
                    "prom1",
                    BlockSelection::All,
                    &[("cluster", "eu-1"), ("replica", "0")],
                )?,
                replica(
                    "prom-ha1",
                    "sidecar-prom-ha1",
                    "prom1",
                    BlockSelection::Last(partial_blocks),
                    &[("cluster", "eu-1"), ("replica", "1")],
                )?,
                replica(
                    "prom2",
                    "sidecar2",
                    "prom2",
                    BlockSelection::All,
                    &[("cluster", "us-1"), ("replica", "0")],
                )?,
            ],
            querier: "query1".to_string(),
        })
    }

    /// Store API endpoints the querier connects to
    pub fn upstream_count(&self) -> usize {
        self.buckets.len() + self.replicas.len()
    }
}

/// A declared, not yet started topology
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub querier: String,
    /// Internal gRPC endpoints the querier was configured with
    pub upstreams: Vec<String>,
    pub plan: StartupPlan,
}

pub struct TopologyBuilder<'a> {
    config: &'a BenchConfig,
    layout: TopologyLayout,
    fs: &'a dyn FileSystem,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(config: &'a BenchConfig, layout: TopologyLayout, fs: &'a dyn FileSystem) -> Self {
        Self { config, layout, fs }
    }

    pub fn layout(&self) -> &TopologyLayout {
        &self.layout
    }

    /// Declare every service on `env` and prepare its directory, fixtures and
    /// configuration files.
    pub async fn build(&self, env: &mut Environment, fixtures: &FixturePaths) -> BenchResult<Topology> {
        let layout = &self.layout;
        let config = self.config;

        // Object store with one pre-populated bucket per long-term fixture
        let minio = catalog::minio(env, &layout.object_store, &config.minio_image, &layout.default_bucket);
        self.declare(env, minio).await?;
        let minio_dir = env.service_dir(&layout.object_store);
        for bucket in &layout.buckets {
            self.copy_all(fixtures.get(&bucket.fixture)?, &minio_dir.join(&bucket.bucket))
                .await?;
        }

        let minio_endpoint = env
            .internal_endpoint(&layout.object_store, "http")
            .map_err(BenchError::Setup)?;
        let mut upstreams = Vec::new();
        let mut stores = Vec::new();
        for bucket in &layout.buckets {
            let bucket_config = render_document(&BucketConfig::s3(
                &bucket.bucket,
                &minio_endpoint,
                catalog::MINIO_ACCESS_KEY,
                catalog::MINIO_SECRET_KEY,
            ))?;
            let store = catalog::thanos_store(env, &bucket.store, &config.thanos_image, &bucket_config);
            self.declare(env, store).await?;
            upstreams.push(self.grpc_endpoint(env, &bucket.store)?);
            stores.push(bucket.store.clone());
        }

        // Scrape sources, each fronted by a sidecar
        let mut sources = Vec::new();
        for replica in &layout.replicas {
            let prometheus = catalog::prometheus(env, &replica.prometheus, &config.prometheus_image);
            self.declare(env, prometheus).await?;

            let dir = env.service_dir(&replica.prometheus);
            let fixture = fixtures.get(&replica.fixture)?;
            match replica.blocks {
                BlockSelection::All => self.copy_all(fixture, &dir).await?,
                BlockSelection::Last(count) => self.copy_last_blocks(fixture, &dir, count).await?,
            }

            let prometheus_config =
                render_document(&PrometheusConfig::with_external_labels(replica.external_labels.clone()))?;
            self.fs
                .write_file(&dir.join(catalog::PROMETHEUS_CONFIG_FILE), &prometheus_config)
                .await
                .map_err(BenchError::Setup)?;

            let sidecar =
                catalog::thanos_sidecar(env, &replica.sidecar, &config.thanos_image, &replica.prometheus)
                    .map_err(BenchError::Setup)?;
            self.declare(env, sidecar).await?;
            upstreams.push(self.grpc_endpoint(env, &replica.sidecar)?);
            sources.push(replica.prometheus.clone());
            sources.push(replica.sidecar.clone());
        }

        let querier = catalog::thanos_querier(&layout.querier, &config.thanos_image, &upstreams);
        self.declare(env, querier).await?;

        let gate = ReadinessGate::metric(
            &layout.querier,
            &[CONNECTIONS_METRIC],
            Comparison::Equals(upstreams.len() as f64),
            MetricWaitOptions::wait_missing(),
        );
        let plan = StartupPlan::new()
            .stage([layout.object_store.clone()])
            .stage(sources.into_iter().chain(stores))
            .gated_stage([layout.querier.clone()], vec![gate]);

        service_info!(
            env.name(),
            "🧩 Declared {} services, querier over {} store APIs",
            env.services().len(),
            upstreams.len()
        );
        Ok(Topology {
            querier: layout.querier.clone(),
            upstreams,
            plan,
        })
    }

    async fn declare(&self, env: &mut Environment, spec: ServiceSpec) -> BenchResult<()> {
        let dir = env.service_dir(&spec.name);
        env.add_service(spec).map_err(BenchError::Setup)?;
        self.fs.create_dir_all(&dir).await.map_err(BenchError::Setup)
    }

    fn grpc_endpoint(&self, env: &Environment, service: &str) -> BenchResult<String> {
        env.internal_endpoint(service, "grpc").map_err(BenchError::Setup)
    }

    async fn copy_all(&self, source: &Path, dest: &Path) -> BenchResult<()> {
        service_debug!("topology", "Copying {} -> {}", source.display(), dest.display());
        self.fs.copy_dir(source, dest).await.map_err(BenchError::Setup)
    }

    /// Copy only the newest `count` blocks, leaving a contiguous suffix
    async fn copy_last_blocks(&self, source: &Path, dest: &Path, count: usize) -> BenchResult<()> {
        let blocks = self.fs.list_subdirs(source).await.map_err(BenchError::Setup)?;
        if blocks.len() <= count {
            return Err(BenchError::configuration(
                "partial_blocks",
                format!(
                    "{} holds {} blocks, a partial replica needs fewer than that but got {}",
                    source.display(),
                    blocks.len(),
                    count
                ),
            ));
        }

        for block in &blocks[blocks.len() - count..] {
            let Some(block_name) = block.file_name() else {
                continue;
            };
            self.copy_all(block, &dest.join(block_name)).await?;
        }
        Ok(())
    }
}
