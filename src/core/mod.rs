// src/core/mod.rs

pub mod command_resolver;
pub mod config_loader;
pub mod config_resolver;
/// Template rendering.
pub mod interpolator;
/// Sequential, fail-fast execution of resolved commands.
pub mod task_executor;
