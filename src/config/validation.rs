//! Service configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bind address parses)
//! - Keep the request timeout above the reload timeout
//! - Reject settings that would leave the API open (empty key)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HarpConfig → Result<(), Vec<String>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::HarpConfig;

pub fn validate_config(config: &HarpConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "listener.bind_address: invalid socket address {:?}",
            config.listener.bind_address
        ));
    }
    if config.admin.api_key.trim().is_empty() {
        errors.push("admin.api_key: must be set".to_string());
    }
    if config.admin.request_timeout_secs == 0 {
        errors.push("admin.request_timeout_secs: must be greater than 0".to_string());
    }
    if config.reload.timeout_secs == 0 {
        errors.push("reload.timeout_secs: must be greater than 0".to_string());
    }
    if config.admin.request_timeout_secs <= config.reload.timeout_secs {
        errors.push(format!(
            "admin.request_timeout_secs: must be greater than reload.timeout_secs ({})",
            config.reload.timeout_secs
        ));
    }
    if let Some(command) = &config.reload.command {
        if command.trim().is_empty() {
            errors.push("reload.command: must not be blank".to_string());
        }
    }
    if let Some(path) = &config.catalog.seed_path {
        if path.as_os_str().is_empty() {
            errors.push("catalog.seed_path: must not be empty".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
