//! Orchestrator library for running containerised test environments
//!
//! Services are declared on an [`Environment`], started stage by stage by the
//! [`Orchestrator`] against readiness and metric gates, and torn down in
//! reverse order. Container, file system and probe I/O sit behind the traits
//! in [`traits`] so every piece can be exercised with mocks.

pub mod core;
pub mod environment;
pub mod error;
pub mod orchestrator;
pub mod service;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use core::{Backoff, Comparison, MetricWaitOptions, ReadinessGate, Stage, StartupPlan};
pub use environment::Environment;
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::Orchestrator;
pub use service::{CONTAINER_SHARED_DIR, Instance, LaunchRequest, ReadinessSpec, ServiceSpec, ToolRun};
pub use services::{DockerLauncher, HttpReadinessProbe, RealFileSystem};
pub use traits::{FileSystem, ProcessLauncher, ReadinessProbe};
