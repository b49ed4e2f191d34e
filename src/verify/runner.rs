//! Subprocess execution for verification commands.
//!
//! Commands run through `sh -c` inside the verification workspace, with a
//! hard timeout. The runner is a capability trait so tests can script
//! outcomes without spawning processes.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from running a verification command.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The command did not finish within the timeout.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// The command could not be spawned.
    #[error("failed to spawn command: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured output of one command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the command exited with status zero.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A short human-readable failure summary (stderr preferred).
    pub fn failure_summary(&self) -> String {
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        // Keep summaries bounded; full output is not useful in warnings.
        detail.chars().take(500).collect()
    }
}

/// Executes a shell command inside a working directory with a timeout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        command: &str,
        dir: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, RunnerError>;
}

/// Production runner backed by `tokio::process`.
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        command: &str,
        dir: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, RunnerError> {
        let child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(dir)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(timeout, child)
            .await
            .map_err(|_| RunnerError::Timeout(timeout))??;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
