//! Environment lifecycle tests
//!
//! Teardown must stop every started instance exactly once, last started
//! first, no matter how the run ended.

mod common;

use assert_matches::assert_matches;
use common::{EventLog, LauncherBuilder, TestHelpers};
use orchestrator::OrchestratorError;

#[tokio::test]
async fn test_close_stops_in_reverse_start_order() {
    let log = EventLog::default();
    let launcher = LauncherBuilder::new(&log).build();
    let mut env = TestHelpers::environment(launcher, &["minio", "store1", "querier"]);

    for name in ["minio", "store1", "querier"] {
        env.start_service(name).await.unwrap();
    }
    env.close().await.unwrap();

    let stops: Vec<String> = log
        .events()
        .into_iter()
        .filter(|e| e.starts_with("stop:"))
        .collect();
    assert_eq!(stops, vec!["stop:querier", "stop:store1", "stop:minio"]);
    assert!(log.position("stop:minio") < log.position("network-rm:demo"));
    assert!(env.instances().is_empty());
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let log = EventLog::default();
    let launcher = LauncherBuilder::new(&log).build();
    let mut env = TestHelpers::environment(launcher, &["minio"]);

    env.start_service("minio").await.unwrap();
    env.close().await.unwrap();
    env.close().await.unwrap();

    assert_eq!(log.count("stop:minio"), 1);
    assert_eq!(log.count("network-rm:demo"), 1);
}

#[tokio::test]
async fn test_start_service_twice_spawns_once() {
    let log = EventLog::default();
    let launcher = LauncherBuilder::new(&log).build();
    let mut env = TestHelpers::environment(launcher, &["prom1"]);

    env.start_service("prom1").await.unwrap();
    env.start_service("prom1").await.unwrap();
    assert_eq!(log.count("spawn:prom1"), 1);

    env.close().await.unwrap();
    assert_eq!(log.count("stop:prom1"), 1);
}

#[tokio::test]
async fn test_stop_failure_still_stops_the_rest() {
    let log = EventLog::default();
    let launcher = LauncherBuilder::new(&log).failing_stop("store1").build();
    let mut env = TestHelpers::environment(launcher, &["minio", "store1", "querier"]);

    for name in ["minio", "store1", "querier"] {
        env.start_service(name).await.unwrap();
    }
    let err = env.close().await.unwrap_err();

    assert_matches!(err, OrchestratorError::Launcher { .. });
    for name in ["querier", "store1", "minio"] {
        assert_eq!(log.count(&format!("stop:{name}")), 1);
    }
    assert_eq!(log.count("network-rm:demo"), 1);
}

#[tokio::test]
async fn test_close_with_keeps_callers_error() {
    let log = EventLog::default();
    let launcher = LauncherBuilder::new(&log).failing_stop("minio").build();
    let mut env = TestHelpers::environment(launcher, &["minio"]);
    env.start_service("minio").await.unwrap();

    let body: Result<(), OrchestratorError> = Err(OrchestratorError::NotStarted {
        name: "querier".to_string(),
    });
    let err = env.close_with(body).await.unwrap_err();

    assert_matches!(err, OrchestratorError::NotStarted { .. });
    assert_eq!(log.count("stop:minio"), 1);
}

#[tokio::test]
async fn test_close_with_surfaces_teardown_error_on_success() {
    let log = EventLog::default();
    let launcher = LauncherBuilder::new(&log).failing_stop("minio").build();
    let mut env = TestHelpers::environment(launcher, &["minio"]);
    env.start_service("minio").await.unwrap();

    let err = env.close_with(Ok::<_, OrchestratorError>(42)).await.unwrap_err();
    assert_matches!(err, OrchestratorError::Launcher { .. });
}

#[tokio::test]
async fn test_unknown_service_cannot_start() {
    let log = EventLog::default();
    let launcher = LauncherBuilder::new(&log).build();
    let mut env = TestHelpers::environment(launcher, &["minio"]);

    let err = env.start_service("prom9").await.unwrap_err();
    assert_matches!(err, OrchestratorError::UnknownService { .. });
    assert!(log.events().is_empty(), "nothing should be created for an unknown service");
}
