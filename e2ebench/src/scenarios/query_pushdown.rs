//! Query pushdown demo
//!
//! Long-term data for eu-1 and us-1 sits in two buckets behind store
//! gateways; the last week lives in three Prometheus instances, two of them
//! an HA pair where one replica only has part of the data. A querier fans out
//! to all five store APIs and the run ends with a graph of series per replica.

use std::future::Future;

use orchestrator::Environment;
use shared::{logging, service_error, service_info, service_warn};

use crate::config::BenchConfig;
use crate::error::{BenchError, BenchResult};
use crate::runtime::{DeepLink, FixtureCache, FixturePaths, GraphQuery};
use crate::topology::{Topology, TopologyBuilder, TopologyLayout};

use super::Harness;

const SCENARIO: &str = "query_pushdown";

/// Make sure all four fixtures are cached. If `interrupt` resolves first,
/// partial output is removed and the run ends with [`BenchError::Interrupted`].
pub async fn fixtures<I>(config: &BenchConfig, harness: &Harness, interrupt: I) -> BenchResult<FixturePaths>
where
    I: Future<Output = ()>,
{
    config.validate()?;
    let cache = FixtureCache::query_pushdown(config)?;
    tokio::select! {
        biased;
        paths = cache.ensure(harness.launcher.as_ref(), harness.fs.as_ref()) => paths,
        () = interrupt => {
            service_warn!(SCENARIO, "🛑 Interrupted while generating fixtures");
            cache.rollback(harness.fs.as_ref()).await?;
            Err(BenchError::Interrupted)
        }
    }
}

/// Run the demo end to end. The environment is torn down on every exit path
/// once it has been created, including `interrupt` resolving mid-run.
pub async fn run<F, I>(config: &BenchConfig, harness: &Harness, completion: F, interrupt: I) -> BenchResult<()>
where
    F: Future<Output = BenchResult<()>>,
    I: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    logging::log_startup(SCENARIO, &format!("environment {}", config.env_name));
    let fixtures = fixtures(config, harness, interrupt.as_mut()).await?;

    let shared_dir = std::path::absolute(config.env_dir())?;
    harness
        .fs
        .remove_dir_all(&shared_dir)
        .await
        .map_err(BenchError::Setup)?;
    harness
        .fs
        .create_dir_all(&shared_dir)
        .await
        .map_err(BenchError::Setup)?;

    let mut env = Environment::new(&config.env_name, shared_dir, harness.launcher.clone());
    let result = tokio::select! {
        biased;
        result = bring_up_and_verify(config, harness, &mut env, &fixtures, completion) => result,
        () = interrupt.as_mut() => {
            service_warn!(SCENARIO, "🛑 Interrupted, tearing down {}", config.env_name);
            Err(BenchError::Interrupted)
        }
    };
    let result = env.close_with(result).await;

    match &result {
        Ok(()) => logging::log_shutdown(SCENARIO, "finished"),
        Err(e) => {
            service_error!(SCENARIO, "❌ Scenario failed: {}", e);
        }
    }
    result
}

async fn bring_up_and_verify<F>(
    config: &BenchConfig,
    harness: &Harness,
    env: &mut Environment,
    fixtures: &FixturePaths,
    completion: F,
) -> BenchResult<()>
where
    F: Future<Output = BenchResult<()>>,
{
    let layout = TopologyLayout::query_pushdown(config.partial_blocks)?;
    let topology = TopologyBuilder::new(config, layout, harness.fs.as_ref())
        .build(env, fixtures)
        .await?;

    harness.orchestrator.start(env, &topology.plan).await?;
    service_info!(SCENARIO, "🎉 {} connected to {} store APIs", topology.querier, topology.upstreams.len());

    let link = deep_link(env, &topology, config)?;
    harness.verifier.present_and_wait(&link, completion).await
}

fn deep_link(env: &Environment, topology: &Topology, config: &BenchConfig) -> BenchResult<DeepLink> {
    let querier = env.instance(&topology.querier)?;
    let endpoint = querier
        .endpoint("http")
        .ok_or_else(|| BenchError::verifier(format!("{} has no published http port", querier.name)))?;
    DeepLink::graph(endpoint, &GraphQuery::replica_count(config.max_time_fresh))
}
