use crate::constants::{DEFAULT_MANIFEST_PATH, MANIFEST_ENV_VAR};
use clap::Parser;

/// Normalised run options.
pub mod args;
/// One handler per top-level action.
pub mod handlers;

/// dave: builds, tests and pushes every variant declared in a manifest.
///
/// Commands are resolved from the manifest's layered defaults and run one at a
/// time, phase by phase: every `build` before any `test`, every `test` before
/// any `push`. The first failing command stops the run.
#[derive(Parser, Debug)]
#[command(name = "dave", author, version, about)]
#[command(disable_help_subcommand = true)]
#[command(
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
pub struct Cli {
    /// Phases to run: `build`, `test`, `push`, or `all`.
    #[arg(required = true, value_name = "COMMAND")]
    pub commands: Vec<String>,

    /// Docker context, or the directory where the Dockerfile resides.
    #[arg(long, short)]
    pub context: Option<String>,

    /// Tags in the context for which the commands need to be run.
    #[arg(long, short, num_args = 1..)]
    pub tags: Vec<String>,

    /// Path to the manifest file.
    #[arg(long, short, default_value = DEFAULT_MANIFEST_PATH, env = MANIFEST_ENV_VAR)]
    pub manifest: String,

    /// Print the resolved commands without running them.
    #[arg(long)]
    pub dry_run: bool,

    /// Run each command through the system shell (`sh -c`) instead of spawning it directly.
    #[arg(long)]
    pub shell: bool,
}
