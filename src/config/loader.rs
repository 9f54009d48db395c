//! Configuration loading from disk.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::HarpConfig;
use crate::config::validation::validate_config;
use crate::model::Configuration;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
}

/// Load and validate the service configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HarpConfig, ConfigError> {
    let config: HarpConfig = read_toml(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    tracing::debug!(path = %path.display(), "Service configuration loaded");
    Ok(config)
}

/// Seed file layout: `[[configurations]]` tables with nested proxies.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Seed {
    configurations: Vec<Configuration>,
}

/// Load the configurations of a seed file.
///
/// Entity invariants are checked when the result is put into a catalog.
pub fn load_seed(path: &Path) -> Result<Vec<Configuration>, ConfigError> {
    let seed: Seed = read_toml(path)?;
    tracing::info!(
        path = %path.display(),
        configurations = seed.configurations.len(),
        "Seed file loaded"
    );
    Ok(seed.configurations)
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
