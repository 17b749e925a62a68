//! Service implementations
//!
//! Real implementations of the capability traits. These are the production
//! implementations that handle actual I/O operations.

pub mod docker;
pub mod file_system;
pub mod http_probe;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use docker::DockerLauncher;
pub use file_system::RealFileSystem;
pub use http_probe::HttpReadinessProbe;
