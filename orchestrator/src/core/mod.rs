//! Core logic modules
//!
//! Pure scheduling and parsing logic with no container or network I/O.

pub mod backoff;
pub mod gate;
pub mod metrics;

pub use backoff::{Attempts, Backoff};
pub use gate::{Comparison, MetricWaitOptions, ReadinessGate, Stage, StartupPlan};
pub use metrics::sum_samples;
