//! Shared test utilities for apptrack integration tests.
//!
//! This module provides:
//! - `TestHarness` for config files written into a temp directory
//! - Builders for pattern tables, company tables, and messages
//! - `FixedPredictor`, a stub model with a canned answer

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
