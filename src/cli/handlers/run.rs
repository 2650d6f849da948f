use crate::{
    cli::args::Options,
    constants::SUCCESS_MESSAGE,
    core::{
        command_resolver::{self, PlannedCommand},
        config_loader,
        task_executor::{self, RunOutcome},
    },
    system::executor::{ProcessRunner, SystemRunner},
};
use anyhow::{Context, Result};
use colored::*;

/// Entry point for a run: load the manifest, resolve the commands, then either
/// list them (`--dry-run`) or execute them.
pub fn handle(options: &Options) -> Result<()> {
    let runner = SystemRunner::new(options.strategy);
    handle_with_runner(options, &runner)
}

/// Same as [`handle`], with the process runner supplied by the caller.
pub fn handle_with_runner<R: ProcessRunner + ?Sized>(options: &Options, runner: &R) -> Result<()> {
    let manifest = config_loader::load_manifest(&options.manifest)
        .with_context(|| "The manifest could not be loaded.")?;

    let plan = command_resolver::plan_commands(
        &manifest,
        &options.commands,
        options.context.as_deref(),
        options.tags.as_deref(),
    );
    log::debug!("Resolved {} command(s).", plan.len());

    if plan.is_empty() {
        println!("{}", "Nothing to run for this selection.".yellow());
        return Ok(());
    }

    if options.dry_run {
        print_plan(&plan);
        return Ok(());
    }

    let commands: Vec<String> = plan.into_iter().map(|p| p.command).collect();
    match task_executor::run_all(&commands, runner)? {
        RunOutcome::Success => {
            println!("{}", SUCCESS_MESSAGE.green());
            Ok(())
        }
        RunOutcome::Failure(failure) => {
            eprintln!("{} {}", "Failed:".red().bold(), failure.command);
            Err(anyhow::Error::new(failure))
        }
    }
}

fn print_plan(plan: &[PlannedCommand]) {
    let mut current_kind = None;
    for planned in plan {
        if current_kind != Some(planned.kind) {
            println!("{}", format!("[{}]", planned.kind).yellow().bold());
            current_kind = Some(planned.kind);
        }
        println!(
            "  {} {}",
            format!("{}:{}", planned.context, planned.tag).dimmed(),
            planned.command.green()
        );
    }
}
