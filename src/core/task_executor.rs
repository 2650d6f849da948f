// src/core/task_executor.rs

use crate::system::executor::{ExecutionError, ProcessRunner};
use colored::*;
use thiserror::Error;

/// A command that ran and exited with a non-zero status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Command #{index} '{command}' failed with exit status {exit_status}.")]
pub struct CommandFailure {
    /// Position of the command in the pipeline.
    pub index: usize,
    /// The command line as run.
    pub command: String,
    /// Its exit status.
    pub exit_status: i32,
    /// Everything it wrote to stderr.
    pub stderr: String,
}

/// Final result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every command exited with status 0.
    Success,
    /// The command that stopped the run.
    Failure(CommandFailure),
}

/// Where a pipeline is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PipelineState {
    Idle,
    Running(usize),
    Succeeded,
    Failed { index: usize, exit_status: i32 },
}

/// Runs commands strictly one after another and stops at the first failure.
#[derive(Debug)]
pub struct Pipeline<'a, R: ProcessRunner + ?Sized> {
    commands: &'a [String],
    runner: &'a R,
    state: PipelineState,
}

impl<'a, R: ProcessRunner + ?Sized> Pipeline<'a, R> {
    /// A pipeline over `commands` that has not started yet.
    pub fn new(commands: &'a [String], runner: &'a R) -> Self {
        Self {
            commands,
            runner,
            state: PipelineState::Idle,
        }
    }

    /// The current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Validates every command, then runs them in order.
    ///
    /// A blank command is a configuration error and is reported before
    /// anything is spawned. A non-zero exit ends the run with
    /// [`RunOutcome::Failure`]; no later command is started.
    pub fn run(&mut self) -> Result<RunOutcome, ExecutionError> {
        validate_commands(self.commands)?;

        for (index, command) in self.commands.iter().enumerate() {
            self.transition(PipelineState::Running(index));
            let command = command.trim();
            println!("{} {}", "→".blue(), command.green());

            let output = self.runner.run(command)?;
            if !output.success() {
                self.transition(PipelineState::Failed {
                    index,
                    exit_status: output.exit_status,
                });
                return Ok(RunOutcome::Failure(CommandFailure {
                    index,
                    command: command.to_string(),
                    exit_status: output.exit_status,
                    stderr: output.stderr,
                }));
            }
        }

        self.transition(PipelineState::Succeeded);
        Ok(RunOutcome::Success)
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Rejects empty or all-whitespace commands.
pub fn validate_commands(commands: &[String]) -> Result<(), ExecutionError> {
    match commands.iter().position(|c| c.trim().is_empty()) {
        Some(index) => Err(ExecutionError::MalformedCommand { index: Some(index) }),
        None => Ok(()),
    }
}

/// Runs every command in order with `runner`. See [`Pipeline::run`].
pub fn run_all<R: ProcessRunner + ?Sized>(
    commands: &[String],
    runner: &R,
) -> Result<RunOutcome, ExecutionError> {
    Pipeline::new(commands, runner).run()
}
