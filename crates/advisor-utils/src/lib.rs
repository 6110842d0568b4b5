//! Shared utilities for advisor-rs
//!
//! Logging setup and small helpers shared across the workspace.

pub mod logging;

pub use logging::init_tracing;
