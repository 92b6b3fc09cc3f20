//! Host command execution
//!
//! Runs argument-vector commands on the host. Commands are never
//! assembled by string interpolation; callers pass argv slices and the
//! rendered command line appears only in logs and errors.

use std::process::{Command, Stdio};

use crate::plan::ExecError;

/// Executes single commands against the host
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl CommandRunner {
    /// Creates a new runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes a command, streaming its output to the terminal.
    ///
    /// Streaming is observability only; callers learn nothing but
    /// success or failure.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::CommandFailed`] on non-zero exit and
    /// [`ExecError::Spawn`] when the process cannot start.
    pub fn run(&self, argv: &[String]) -> Result<(), ExecError> {
        let command = shell_words::join(argv);
        let (program, args) = split_argv(argv)?;

        tracing::debug!(command = %command, "running command");

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| ExecError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ExecError::CommandFailed {
                command,
                code: status.code().unwrap_or(-1),
            });
        }

        Ok(())
    }

    /// Executes a command and returns its captured standard output.
    /// Standard error passes through to the terminal.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::CommandFailedWithOutput`] on non-zero exit,
    /// carrying whatever output was captured, and [`ExecError::Spawn`]
    /// when the process cannot start.
    pub fn capture(&self, argv: &[String]) -> Result<String, ExecError> {
        let command = shell_words::join(argv);
        let (program, args) = split_argv(argv)?;

        tracing::debug!(command = %command, "capturing command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ExecError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if !output.status.success() {
            return Err(ExecError::CommandFailedWithOutput {
                command,
                code: output.status.code().unwrap_or(-1),
                output: stdout,
            });
        }

        Ok(stdout)
    }
}

fn split_argv(argv: &[String]) -> Result<(&String, &[String]), ExecError> {
    argv.split_first().ok_or(ExecError::EmptyCommand)
}
