//! Common test utilities and infrastructure
//!
//! Fixture trees on disk, recording mocks and a ready-made harness.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{EventLog, StallingLauncher, TestHelpers};
