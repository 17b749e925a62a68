//! Shared types for the query pushdown bench workspace
//!
//! Contains only the pieces both the orchestrator and the bench harness need:
//! label sets, port declarations, configuration rendering, errors and logging.

pub mod config;
pub mod errors;
pub mod logging;
pub mod types;

pub use config::render_document;
pub use errors::*;
pub use types::*;
