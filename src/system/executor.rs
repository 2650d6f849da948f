// src/system/executor.rs

use std::io::{BufRead, BufReader, Write};
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

/// Errors that stop a run before or while a process is spawned.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A blank command line. `index` is its position in the pipeline, when known.
    #[error(
        "Command{} is empty; check the templates in the manifest.",
        .index.map(|i| format!(" #{}", i)).unwrap_or_default()
    )]
    MalformedCommand { index: Option<usize> },
    /// The process could not be started or waited on.
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, #[source] std::io::Error),
}

/// A command line split into its program and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitCommand<'a> {
    /// The first word.
    pub program: &'a str,
    /// Every following word.
    pub args: Vec<&'a str>,
}

/// Splits a command line on whitespace.
///
/// There is no quoting: an argument cannot contain a space. Use the shell
/// strategy when a command needs quoting, pipes, redirection or globs.
pub fn split_command(command_line: &str) -> Result<SplitCommand<'_>, ExecutionError> {
    let mut parts = command_line.split_whitespace();
    let program = parts
        .next()
        .ok_or(ExecutionError::MalformedCommand { index: None })?;
    Ok(SplitCommand {
        program,
        args: parts.collect(),
    })
}

/// How a command line is turned into a process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Split on whitespace and spawn the program directly.
    #[default]
    Direct,
    /// Hand the whole line to `sh -c` (`cmd /C` on Windows).
    Shell,
}

/// What a finished process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `128 + signal` when the process was killed.
    pub exit_status: i32,
    /// Everything the process wrote to stderr.
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Runs one command to completion.
pub trait ProcessRunner {
    /// Runs `command_line` and waits for it to exit.
    fn run(&self, command_line: &str) -> Result<ProcessOutput, ExecutionError>;
}

/// Spawns real processes. Stdout is inherited; stderr is streamed through to
/// the terminal line by line and captured at the same time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    /// How each command line becomes a process.
    pub strategy: Strategy,
}

impl SystemRunner {
    /// A runner using `strategy`.
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    fn build(&self, command_line: &str) -> Result<StdCommand, ExecutionError> {
        let command = match self.strategy {
            Strategy::Direct => {
                let split = split_command(command_line)?;
                let mut command = StdCommand::new(split.program);
                command.args(&split.args);
                command
            }
            Strategy::Shell => {
                let (shell, flag) = if cfg!(target_os = "windows") {
                    ("cmd", "/C")
                } else {
                    ("sh", "-c")
                };
                let mut command = StdCommand::new(shell);
                command.arg(flag).arg(command_line);
                command
            }
        };
        Ok(command)
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, command_line: &str) -> Result<ProcessOutput, ExecutionError> {
        let trimmed_command = command_line.trim();
        let mut command = self.build(trimmed_command)?;
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| ExecutionError::CommandFailed(trimmed_command.to_string(), e))?;

        let mut captured = Vec::new();
        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr);
            let mut terminal = std::io::stderr();
            let mut line = Vec::new();
            loop {
                line.clear();
                let read = reader
                    .read_until(b'\n', &mut line)
                    .map_err(|e| ExecutionError::CommandFailed(trimmed_command.to_string(), e))?;
                if read == 0 {
                    break;
                }
                // The terminal copy is best effort; the captured copy is what gets reported.
                let _ = terminal.write_all(&line);
                captured.extend_from_slice(&line);
            }
        }

        let status = child
            .wait()
            .map_err(|e| ExecutionError::CommandFailed(trimmed_command.to_string(), e))?;

        Ok(ProcessOutput {
            exit_status: exit_code(status),
            stderr: String::from_utf8_lossy(&captured).into_owned(),
        })
    }
}

/// The numeric exit status, using the shell convention `128 + signal` for
/// processes killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
