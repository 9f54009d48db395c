//! Service configuration subsystem.
//!
//! # Data Flow
//! ```text
//! service file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, all problems reported)
//!     → HarpConfig (validated, immutable)
//!     → startup builds the catalog from [catalog].seed_path
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Seed files hold managed entities, not service settings, and go through
//!   the same validation as API creation

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_seed, ConfigError};
pub use validation::validate_config;
pub use schema::{
    AdminConfig, CatalogConfig, HarpConfig, ListenerConfig, ObservabilityConfig, ReloadConfig,
};
