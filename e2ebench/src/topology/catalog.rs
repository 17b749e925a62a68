//! Service catalogue
//!
//! Command lines, ports and readiness checks of the collaborating services.
//! Paths are in-container paths under the environment's shared directory;
//! peers are addressed by their internal endpoints, which are known before
//! anything runs.

use orchestrator::{Environment, OrchestratorResult, ReadinessSpec, ServiceSpec};
use shared::PortSpec;

pub const MINIO_ACCESS_KEY: &str = "Cheescake";
pub const MINIO_SECRET_KEY: &str = "supersecret";

pub const MINIO_HTTP_PORT: u16 = 8090;
pub const PROMETHEUS_HTTP_PORT: u16 = 9090;
pub const THANOS_HTTP_PORT: u16 = 8080;
pub const THANOS_GRPC_PORT: u16 = 9091;

/// Name of the prometheus config file inside a prometheus service dir
pub const PROMETHEUS_CONFIG_FILE: &str = "prometheus.yml";

/// S3-compatible object store serving every top-level dir of its data dir as a bucket
pub fn minio(env: &Environment, name: &str, image: &str, default_bucket: &str) -> ServiceSpec {
    let dir = env.container_dir(name);
    ServiceSpec::new(name, image)
        .entrypoint("sh")
        .args([
            "-c".to_string(),
            format!("mkdir -p {dir}/{default_bucket} && minio server --address :{MINIO_HTTP_PORT} --quiet {dir}"),
        ])
        .env("MINIO_ACCESS_KEY", MINIO_ACCESS_KEY)
        .env("MINIO_SECRET_KEY", MINIO_SECRET_KEY)
        .port(PortSpec::http(MINIO_HTTP_PORT))
        .readiness(ReadinessSpec::http("http", "/minio/health/ready"))
}

/// Prometheus keeping its TSDB in its service dir, with 2h blocks and no
/// retention cut so copied historical blocks survive
pub fn prometheus(env: &Environment, name: &str, image: &str) -> ServiceSpec {
    let dir = env.container_dir(name);
    ServiceSpec::new(name, image)
        .args([
            format!("--config.file={dir}/{PROMETHEUS_CONFIG_FILE}"),
            format!("--storage.tsdb.path={dir}"),
            "--storage.tsdb.max-block-duration=2h".to_string(),
            "--storage.tsdb.min-block-duration=2h".to_string(),
            "--storage.tsdb.retention.time=1000d".to_string(),
            format!("--web.listen-address=:{PROMETHEUS_HTTP_PORT}"),
            "--web.enable-lifecycle".to_string(),
            "--log.level=info".to_string(),
        ])
        .port(PortSpec::http(PROMETHEUS_HTTP_PORT))
        .readiness(ReadinessSpec::http("http", "/-/ready"))
        .metrics_on("http")
}

fn thanos(name: &str, image: &str, component: &str) -> ServiceSpec {
    ServiceSpec::new(name, image)
        .args([
            component.to_string(),
            format!("--debug.name={name}"),
            format!("--grpc-address=:{THANOS_GRPC_PORT}"),
            "--grpc-grace-period=0s".to_string(),
            format!("--http-address=:{THANOS_HTTP_PORT}"),
            "--log.level=info".to_string(),
        ])
        .port(PortSpec::http(THANOS_HTTP_PORT))
        .port(PortSpec::grpc(THANOS_GRPC_PORT))
        .readiness(ReadinessSpec::http("http", "/-/ready"))
        .metrics_on("http")
}

/// Sidecar exposing `prometheus`' local TSDB over the store API
pub fn thanos_sidecar(
    env: &Environment,
    name: &str,
    image: &str,
    prometheus: &str,
) -> OrchestratorResult<ServiceSpec> {
    let prometheus_url = format!("http://{}", env.internal_endpoint(prometheus, "http")?);
    Ok(thanos(name, image, "sidecar").args([
        format!("--prometheus.url={prometheus_url}"),
        format!("--tsdb.path={}", env.container_dir(prometheus)),
    ]))
}

/// Store gateway over one bucket; `bucket_config` is the rendered client config
pub fn thanos_store(env: &Environment, name: &str, image: &str, bucket_config: &str) -> ServiceSpec {
    thanos(name, image, "store").args([
        format!("--data-dir={}/data", env.container_dir(name)),
        format!("--objstore.config={bucket_config}"),
    ])
}

/// Querier fanning out to `stores` (internal gRPC endpoints), deduplicating on `replica`
pub fn thanos_querier(name: &str, image: &str, stores: &[String]) -> ServiceSpec {
    thanos(name, image, "query")
        .arg("--query.replica-label=replica")
        .args(stores.iter().map(|store| format!("--store={store}")))
}
