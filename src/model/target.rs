//! Ranked backend-selection bindings owned by a frontend.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::error::{self, Constraint, ValidationError};

/// Condition operator of a `use_backend` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    If,
    Unless,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::If => write!(f, "if"),
            Operator::Unless => write!(f, "unless"),
        }
    }
}

/// `use_backend <backend> <operator> <condition>`, emitted in rank order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Target {
    rank: u32,
    backend: String,
    #[serde(default)]
    pub operator: Operator,
    condition: String,
}

impl Target {
    pub fn new(
        rank: u32,
        backend: impl Into<String>,
        operator: Operator,
        condition: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let target = Self {
            rank,
            backend: backend.into(),
            operator,
            condition: condition.into(),
        };
        target.validate()?;
        Ok(target)
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn set_backend(&mut self, backend: impl Into<String>) -> Result<(), ValidationError> {
        let backend = backend.into();
        error::token("target.backend", &backend)?;
        self.backend = backend;
        Ok(())
    }

    pub fn set_condition(&mut self, condition: impl Into<String>) -> Result<(), ValidationError> {
        let condition = condition.into();
        error::required("target.condition", &condition)?;
        self.condition = condition;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rank < 1 {
            return Err(ValidationError::new("target.rank", Constraint::Minimum(1)));
        }
        error::token("target.backend", &self.backend)?;
        error::required("target.condition", &self.condition)
    }
}
