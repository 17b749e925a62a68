//! Benchmark harness error types

use orchestrator::OrchestratorError;
use shared::SharedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    /// Fixture generation failed; partial output has been removed
    #[error("Generating fixture '{fixture}' failed: {source}")]
    Generation {
        fixture: String,
        #[source]
        source: OrchestratorError,
    },

    /// Preparing service directories or configuration failed
    #[error("Environment setup failed: {0}")]
    Setup(OrchestratorError),

    #[error("Startup failed: {0}")]
    Startup(#[from] OrchestratorError),

    #[error("Invalid configuration for {field}: {message}")]
    Configuration { field: String, message: String },

    #[error("Interactive verification failed: {message}")]
    Verifier { message: String },

    /// Ctrl+C arrived before the run finished; cleanup has already run
    #[error("Interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),
}

impl BenchError {
    pub fn configuration(field: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn verifier(message: impl Into<String>) -> Self {
        Self::Verifier {
            message: message.into(),
        }
    }
}

pub type BenchResult<T> = Result<T, BenchError>;
