//! Execution of assembled commands
//!
//! The deployment engine only produces command strings. Running them goes
//! through [`CommandRunner`] so callers can substitute their own executor.

use std::io;
use std::process::{Command, Stdio};

use tracing::debug;

/// Errors from running a shell command
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Failed to start command: {0}")]
    Spawn(#[from] io::Error),

    #[error("Command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Runs an assembled shell command
pub trait CommandRunner {
    /// Run with inherited stdio
    fn run(&self, cmd: &str) -> Result<(), RunnerError>;

    /// Run and capture stdout
    fn read_output(&self, cmd: &str) -> Result<String, RunnerError>;
}

/// Runs commands through `sh -c`
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, cmd: &str) -> Result<(), RunnerError> {
        debug!(cmd, "running");
        let status = Command::new("sh").arg("-c").arg(cmd).status()?;
        if !status.success() {
            return Err(RunnerError::Failed {
                status: status.to_string(),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    fn read_output(&self, cmd: &str) -> Result<String, RunnerError> {
        debug!(cmd, "running for output");
        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(RunnerError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
