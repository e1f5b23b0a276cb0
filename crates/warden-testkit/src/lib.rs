//! Shared fixtures and mock collaborators for Warden tests
//!
//! Every engine collaborator has an in-process mock here, plus builders for
//! directory snapshots, transaction payloads, and policies, so integration
//! tests read as scenarios instead of setup.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod clock;
pub mod fixtures;
pub mod harness;
pub mod logging;
pub mod mocks;

pub use clock::FixedClock;
pub use fixtures::*;
pub use harness::TestHarness;
pub use logging::init_tracing;
pub use mocks::{MockDirectory, MockPriceFeed, MockTransferFeed, StaticPolicyProvider};
