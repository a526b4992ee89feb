//! Utility functions and helpers.
//!
//! - [`parallel`] - Per-file worker pool with isolated failures
//! - [`inputs`] - Glob expansion and `.json` input filtering
//! - [`progress`] - Progress display
//! - [`format`] - Number formatting
//! - [`logging`] - `tracing` subscriber setup

pub mod format;
pub mod inputs;
pub mod logging;
pub mod parallel;
pub mod progress;
