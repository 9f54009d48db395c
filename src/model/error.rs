//! Field-level validation errors raised by entity mutators.

use std::fmt;
use thiserror::Error;

use crate::keys::DELIMITER;

/// The constraint a rejected value violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// A required value was missing or blank.
    Required,
    /// The value collides with a sibling in the same scope.
    Unique,
    /// A numeric value is below its minimum.
    Minimum(u32),
    /// An identifying token contains whitespace or the id delimiter.
    Token,
    /// The field cannot be changed after creation.
    ReadOnly,
    /// The value could not be interpreted (wrong type, unknown variant).
    Invalid(String),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Required => write!(f, "is required"),
            Constraint::Unique => write!(f, "must be unique"),
            Constraint::Minimum(min) => write!(f, "must be at least {}", min),
            Constraint::Token => write!(
                f,
                "must not contain whitespace or '{}'",
                DELIMITER
            ),
            Constraint::ReadOnly => write!(f, "is read-only"),
            Constraint::Invalid(reason) => write!(f, "is invalid: {}", reason),
        }
    }
}

/// A mutation was rejected because it would break an entity invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {constraint}")]
pub struct ValidationError {
    /// Name of the offending field, qualified by scope where useful (`server.port`).
    pub field: String,
    pub constraint: Constraint,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            field: field.into(),
            constraint,
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, Constraint::Required)
    }

    pub fn unique(field: impl Into<String>) -> Self {
        Self::new(field, Constraint::Unique)
    }
}

/// Check an identifying name: non-empty, no whitespace, no id delimiter.
pub(crate) fn token(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.chars().any(|c| c.is_whitespace() || c == DELIMITER) {
        return Err(ValidationError::new(field, Constraint::Token));
    }
    Ok(())
}

/// Check a required single word (addresses, paths): non-empty, no whitespace.
pub(crate) fn word(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ValidationError::new(
            field,
            Constraint::Invalid("whitespace is not allowed".to_string()),
        ));
    }
    Ok(())
}

/// Check a required free-text value.
pub(crate) fn required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    single_line(field, Some(value))
}

/// Every value lands on one directive line; a line break would inject directives.
pub(crate) fn single_line(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v.contains(['\n', '\r']) => Err(ValidationError::new(
            field,
            Constraint::Invalid("line breaks are not allowed".to_string()),
        )),
        _ => Ok(()),
    }
}
