//! Resolves a layered build manifest into ordered `build`, `test` and `push`
//! commands, and runs them one at a time with fail-fast semantics.

/// Argument parsing and the run handler.
pub mod cli;
/// Names and defaults shared across the crate.
pub mod constants;
/// Manifest loading, resolution and the execution pipeline.
pub mod core;
/// The manifest data model.
pub mod models;
pub mod system;
