//! Service configuration schema.
//!
//! All types derive Serde traits for deserialization from the service file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the management service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HarpConfig {
    /// Listener for the management API.
    pub listener: ListenerConfig,

    /// API authentication and request limits.
    pub admin: AdminConfig,

    /// Service-wide reload defaults.
    pub reload: ReloadConfig,

    /// Where the initial catalog comes from.
    pub catalog: CatalogConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:7070").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:7070".to_string(),
        }
    }
}

/// Management API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// API key for authentication (Bearer token). Must be set.
    pub api_key: String,

    /// Per-request timeout in seconds, commits included. Must exceed
    /// `reload.timeout_secs` so a hung reload surfaces as a reload failure.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            request_timeout_secs: 60,
        }
    }
}

impl AdminConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Reload defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Used when a configuration has no reload command of its own.
    pub command: Option<String>,

    /// Time limit for one reload command in seconds.
    pub timeout_secs: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: 30,
        }
    }
}

impl ReloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Initial catalog contents.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// TOML file with `[[configurations]]` tables.
    pub seed_path: Option<PathBuf>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
