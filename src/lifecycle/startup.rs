//! Startup orchestration.
//!
//! # Responsibilities
//! - Seed the catalog from the configured file
//! - Build the committer from the reload defaults
//! - Assemble the shared handler state
//!
//! # Design Decisions
//! - Fail fast: an unreadable seed or an invalid entity in it is fatal
//! - Seed entities pass the same validation as API creation

use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::commit::Committer;
use crate::config::{load_seed, ConfigError, HarpConfig};
use crate::http::AppState;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid seed: {0}")]
    Catalog(#[from] CatalogError),
}

/// Build handler state from a validated service configuration.
pub fn build_state(config: &HarpConfig) -> Result<AppState, StartupError> {
    let configurations = match &config.catalog.seed_path {
        Some(path) => load_seed(path)?,
        None => Vec::new(),
    };
    let catalog = Catalog::from_configurations(configurations)?;
    tracing::info!(
        configurations = catalog.configurations().len(),
        "Catalog ready"
    );

    let committer =
        Committer::new(config.reload.timeout()).with_default_command(config.reload.command.clone());

    Ok(AppState::new(
        catalog,
        committer,
        config.admin.api_key.as_str(),
    ))
}
