//! Query pushdown demo runner
//!
//! Generates or reuses fixtures, brings the topology up in docker and waits
//! for the completion endpoint to be hit before tearing everything down.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use e2ebench::{BenchConfig, Harness, TestScenarios};
use shared::logging;

#[derive(Parser)]
#[command(name = "e2ebench")]
#[command(about = "Interactive query pushdown demo on a local docker topology")]
struct Args {
    /// Scenario to run
    #[arg(long, env = "E2EBENCH_SCENARIO", default_value = "query_pushdown")]
    scenario: String,

    /// Fixture cache directory, reused when it exists
    #[arg(long, env = "E2EBENCH_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory the environment's shared dir is created in
    #[arg(long, env = "E2EBENCH_WORK_DIR", default_value = ".")]
    work_dir: PathBuf,

    /// Environment and network name
    #[arg(long, env = "E2EBENCH_ENV_NAME", default_value = "query_pushdown_demo")]
    env_name: String,

    /// Thanos image for stores, sidecars and the querier
    #[arg(long, env = "E2EBENCH_THANOS_IMAGE", default_value = "thanos:latest")]
    thanos_image: String,

    /// Blocks copied to the partial HA replica
    #[arg(long, env = "E2EBENCH_PARTIAL_BLOCKS", default_value = "5")]
    partial_blocks: usize,

    /// Completion endpoint port (0 picks a free one)
    #[arg(long, env = "E2EBENCH_VERIFY_PORT", default_value = "0")]
    verify_port: u16,

    /// Print the deep link instead of opening a browser
    #[arg(long, env = "E2EBENCH_NO_BROWSER")]
    no_browser: bool,

    /// Docker-compatible CLI to use
    #[arg(long, env = "E2EBENCH_DOCKER", default_value = "docker")]
    docker_binary: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "E2EBENCH_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    logging::init_tracing(Some(&args.log_level));
    tracing::info!("🧪 Scenario: {}", args.scenario);

    let config = BenchConfig::builder()
        .data_dir(args.data_dir)
        .work_dir(args.work_dir)
        .env_name(args.env_name)
        .thanos_image(args.thanos_image)
        .partial_blocks(args.partial_blocks)
        .verify_port(args.verify_port)
        .open_browser(!args.no_browser)
        .docker_binary(args.docker_binary)
        .log_level(args.log_level)
        .build();

    let harness = Harness::docker(&config).context("Failed to set up the harness")?;
    let scenarios = TestScenarios::new(config, harness);

    scenarios
        .run_scenario(&args.scenario)
        .await
        .with_context(|| format!("Scenario '{}' failed", args.scenario))?;

    tracing::info!("🏁 Done");
    Ok(())
}
