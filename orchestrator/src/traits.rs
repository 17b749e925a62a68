//! Trait definitions with mockall annotations for testing
//!
//! These are the narrow capabilities the harness needs from the outside world:
//! a container runtime, a file system and a way to probe running services.
//! Real implementations live in [`crate::services`]; tests use the generated
//! `Mock*` types.

use std::path::{Path, PathBuf};

use crate::error::OrchestratorResult;
use crate::service::{Instance, LaunchRequest, ToolRun};

/// Container runtime abstraction
#[mockall::automock]
#[async_trait::async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Create the internal network services talk over, replacing stale leftovers
    async fn create_network(&self, network: &str) -> OrchestratorResult<()>;

    /// Remove the internal network
    async fn remove_network(&self, network: &str) -> OrchestratorResult<()>;

    /// Start a long-running service and report its endpoints
    async fn spawn(&self, request: &LaunchRequest) -> OrchestratorResult<Instance>;

    /// Stop a started service and release its resources
    async fn stop(&self, instance: &Instance) -> OrchestratorResult<()>;

    /// Run one-shot tools with each stage's stdout piped into the next stage's
    /// stdin, and wait for all of them to finish
    async fn run_pipeline(&self, stages: &[ToolRun]) -> OrchestratorResult<()>;
}

/// File system abstraction for fixture copies and configuration writes
#[mockall::automock]
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    async fn create_dir_all(&self, path: &Path) -> OrchestratorResult<()>;

    async fn exists(&self, path: &Path) -> bool;

    async fn write_file(&self, path: &Path, contents: &str) -> OrchestratorResult<()>;

    /// Copy the contents of `source` into `dest`, creating `dest` if needed
    async fn copy_dir(&self, source: &Path, dest: &Path) -> OrchestratorResult<()>;

    /// Immediate subdirectories of `path`, sorted by name
    async fn list_subdirs(&self, path: &Path) -> OrchestratorResult<Vec<PathBuf>>;

    /// Removing a missing directory is not an error
    async fn remove_dir_all(&self, path: &Path) -> OrchestratorResult<()>;

    /// Atomically move `from` onto `to`
    async fn rename(&self, from: &Path, to: &Path) -> OrchestratorResult<()>;
}

/// Health and metrics surface of running services
#[mockall::automock]
#[async_trait::async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Whether the instance currently passes its readiness check.
    /// Connection failures are `Ok(false)`, not errors.
    async fn is_ready(&self, instance: &Instance) -> OrchestratorResult<bool>;

    /// Raw Prometheus text exposition from the instance's metrics port
    async fn scrape_metrics(&self, instance: &Instance) -> OrchestratorResult<String>;
}
