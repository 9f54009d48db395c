//! External reload invocation.
//!
//! # Design Decisions
//! - The command line is split on whitespace; there is no shell and no quoting
//! - The child is killed if the caller's time limit expires first
//! - Non-zero exit status carries the child's stderr for diagnostics

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Reload failed; the configuration file already written stays in place.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("reload command is empty")]
    EmptyCommand,

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {}: {stderr}", exit_status(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} did not finish within {after:?}")]
    Timeout { program: String, after: Duration },
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

/// A parsed reload command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadCommand {
    program: String,
    args: Vec<String>,
}

impl ReloadCommand {
    pub fn parse(line: &str) -> Result<Self, ReloadError> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(ReloadError::EmptyCommand)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run to completion, waiting at most `limit`.
    pub async fn run(&self, limit: Duration) -> Result<(), ReloadError> {
        tracing::debug!(program = %self.program, args = ?self.args, "Launching reload command");

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match timeout(limit, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ReloadError::Launch {
                    program: self.program.clone(),
                    source,
                })
            }
            Err(_) => {
                tracing::warn!(program = %self.program, timeout_ms = limit.as_millis() as u64, "Reload command timed out");
                return Err(ReloadError::Timeout {
                    program: self.program.clone(),
                    after: limit,
                });
            }
        };

        if !output.status.success() {
            return Err(ReloadError::Exit {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
