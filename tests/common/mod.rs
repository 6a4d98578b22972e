//! Common test utilities and helpers
//!
//! Shared fixtures for the integration tests: fake and real repositories on
//! disk, and configuration files pointing at them.
#![allow(dead_code)]

pub mod test_fixtures;
pub mod test_helpers;
