//! Common test utilities for API integration tests.

pub mod assertions;
pub mod harness;

pub use assertions::*;
pub use harness::*;
