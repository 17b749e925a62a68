//! Query pushdown demo harness
//!
//! Caches synthetic TSDB fixtures, declares a federated query topology
//! (object store, store gateways, Prometheus replicas with sidecars, and a
//! querier), starts it in dependency order behind readiness and metric gates,
//! and ends with an interactive checkpoint in the query UI.
//!
//! ## Quick Start
//!
//! ```no_run
//! use e2ebench::*;
//!
//! # async fn demo() -> BenchResult<()> {
//! let config = BenchConfig::builder()
//!     .data_dir("data")
//!     .open_browser(false)
//!     .build();
//!
//! let scenarios = TestScenarios::new(config.clone(), Harness::docker(&config)?);
//! scenarios.run_scenario("smoke").await
//! # }
//! ```

// Core modules
pub mod config;
pub mod error;
pub mod runtime;
pub mod scenarios;
pub mod topology;

// Main interfaces - re-exported at crate root for convenience
pub use config::{BenchConfig, BenchConfigBuilder};
pub use error::{BenchError, BenchResult};
pub use scenarios::{Harness, TestScenarios};

// Supporting types
pub use runtime::{
    DeepLink, EndpointHit, FixtureCache, FixturePaths, FixtureSpec, GraphQuery, InteractiveVerifier,
    LinkOpener,
};
pub use topology::{Topology, TopologyBuilder, TopologyLayout};
