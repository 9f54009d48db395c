//! Named boolean tests scoped to a proxy.
//!
//! Several rows may share a name; together they form one disjunction set,
//! addressed as a single resource by the catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::error::{self, ValidationError};

/// One `acl <name> <expression>` row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Acl {
    name: String,
    expression: String,
}

impl Acl {
    pub fn new(
        name: impl Into<String>,
        expression: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let acl = Self {
            name: name.into(),
            expression: expression.into(),
        };
        acl.validate()?;
        Ok(acl)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        error::token("acl.name", &self.name)?;
        error::required("acl.expression", &self.expression)
    }
}

/// Outcome of reconciling one ACL set against a desired list of expressions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AclDiff {
    /// Desired expressions not currently stored, in desired order.
    pub added: Vec<String>,
    /// Stored expressions no longer desired, in stored order.
    pub removed: Vec<String>,
}

impl AclDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Set difference between the stored and desired expressions of one ACL name.
pub fn diff(current: &[&str], desired: &[String]) -> AclDiff {
    let added = desired
        .iter()
        .filter(|d| !current.contains(&d.as_str()))
        .cloned()
        .collect();
    let removed = current
        .iter()
        .filter(|c| !desired.iter().any(|d| d == *c))
        .map(|c| c.to_string())
        .collect();
    AclDiff { added, removed }
}

/// A set must be non-empty text without repeats.
pub(crate) fn check_expressions(expressions: &[String]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for expression in expressions {
        error::required("acl.expression", expression)?;
        if !seen.insert(expression.as_str()) {
            return Err(ValidationError::unique("acl.expression"));
        }
    }
    Ok(())
}
