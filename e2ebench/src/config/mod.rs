//! Configuration Management
//!
//! Harness configuration and its builder.

pub mod bench;
pub mod builder;

// Re-export main types
pub use bench::BenchConfig;
pub use builder::BenchConfigBuilder;
