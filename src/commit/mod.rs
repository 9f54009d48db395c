//! Commit orchestration: render → write → reload.
//!
//! # Data Flow
//! ```text
//! commit requested for a Configuration
//!     → render (pure, may fail with RenderError)
//!     → truncate-write of configuration.filepath
//!     → reload command (configuration's own, else the service default)
//! ```
//!
//! # Design Decisions
//! - Write failure aborts before any reload is attempted
//! - Reload failure never rolls back the written file
//! - The file handle is scoped to the write step and closed on every path
//! - No retries; the caller decides

pub mod reload;

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::model::Configuration;
use crate::render::{self, RenderError};

pub use reload::{ReloadCommand, ReloadError};

/// Errors that abort a commit.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file at `path` was written; only the reload failed.
    #[error("wrote {} but reload failed: {source}", .path.display())]
    Reload {
        path: PathBuf,
        #[source]
        source: ReloadError,
    },
}

/// What a successful commit did.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CommitReport {
    pub path: PathBuf,
    pub bytes: usize,
    /// Whether a reload command ran (and succeeded).
    pub reloaded: bool,
}

/// Runs commits with a fixed reload time limit and optional fallback command.
#[derive(Debug, Clone)]
pub struct Committer {
    reload_timeout: Duration,
    default_command: Option<String>,
}

impl Committer {
    pub fn new(reload_timeout: Duration) -> Self {
        Self {
            reload_timeout,
            default_command: None,
        }
    }

    /// Command used for configurations that do not set their own.
    pub fn with_default_command(mut self, command: Option<String>) -> Self {
        self.default_command = command;
        self
    }

    pub async fn commit(&self, configuration: &Configuration) -> Result<CommitReport, CommitError> {
        let text = render::render(configuration)?;
        let path = configuration.filepath().to_path_buf();

        write_file(&path, &text)
            .await
            .map_err(|source| CommitError::Write {
                path: path.clone(),
                source,
            })?;
        tracing::info!(
            configuration = %configuration.name(),
            path = %path.display(),
            bytes = text.len(),
            "Configuration written"
        );

        let command = configuration
            .reload_command
            .as_deref()
            .or(self.default_command.as_deref());

        let reloaded = match command {
            Some(line) => {
                let result = match ReloadCommand::parse(line) {
                    Ok(command) => command.run(self.reload_timeout).await,
                    Err(e) => Err(e),
                };
                if let Err(source) = result {
                    tracing::error!(
                        configuration = %configuration.name(),
                        error = %source,
                        "Reload failed; written configuration retained"
                    );
                    return Err(CommitError::Reload { path, source });
                }
                tracing::info!(configuration = %configuration.name(), "Proxy reloaded");
                true
            }
            None => false,
        };

        Ok(CommitReport {
            path,
            bytes: text.len(),
            reloaded,
        })
    }
}

async fn write_file(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await
}
