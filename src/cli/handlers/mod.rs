// src/cli/handlers/mod.rs

/// Loads, resolves and runs (or lists) the selected commands.
pub mod run;
