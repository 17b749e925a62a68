//! Orchestrator-specific error types

use shared::SharedError;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Service '{service}' failed to start: {reason}")]
    Startup { service: String, reason: String },

    #[error("Gate '{gate}' on service '{service}' not satisfied after {attempts} attempts")]
    GateTimeout {
        service: String,
        gate: String,
        attempts: u32,
    },

    #[error("Service '{service}' does not expose metrics {metrics:?}")]
    MetricMissing { service: String, metrics: Vec<String> },

    #[error("Container runtime command `{command}` failed: {message}")]
    Launcher { command: String, message: String },

    #[error("Service '{name}' is already declared in environment '{environment}'")]
    DuplicateService { name: String, environment: String },

    #[error("Unknown service: {name}")]
    UnknownService { name: String },

    #[error("Service '{service}' does not declare port '{port}'")]
    UnknownPort { service: String, port: String },

    #[error("Service '{name}' has not been started")]
    NotStarted { name: String },

    #[error("File system operation failed: {operation} on {path}: {message}")]
    FileSystem {
        operation: String,
        path: String,
        message: String,
    },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrchestratorError {
    pub fn startup(service: &str, reason: impl std::fmt::Display) -> Self {
        Self::Startup {
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn launcher(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Launcher {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn file_system(operation: &str, path: &Path, error: impl std::fmt::Display) -> Self {
        Self::FileSystem {
            operation: operation.to_string(),
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
