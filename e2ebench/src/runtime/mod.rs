//! Runtime Management
//!
//! Fixture caching and the interactive verification step.

pub mod fixtures;
pub mod verifier;

pub use fixtures::{FixtureCache, FixturePaths, FixtureSpec};
pub use verifier::{
    BrowserOpener, DeepLink, EndpointHit, GraphQuery, InteractiveVerifier, LinkOpener, MockLinkOpener,
    StdoutOpener,
};
