//! Rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration
//!     → sections.rs (global, defaults)
//!     → proxy.rs (every frontend, then every backend)
//!     → blocks joined by one blank line, trailing newline
//! ```
//!
//! # Design Decisions
//! - Pure: no I/O, no hidden state; identical input yields identical bytes
//! - Order comes only from collections and fixed tables, never from hashing
//! - Targets are emitted by ascending rank regardless of insertion order
//! - A violated entity invariant is a `RenderError`, never silently skipped

mod directive;
mod proxy;
mod sections;

use thiserror::Error;

use crate::model::Configuration;

/// An entity invariant that validation should have caught was found broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("{section}: {field} is empty")]
    MissingField {
        section: String,
        field: &'static str,
    },

    #[error("{section}: duplicate {what} {value}")]
    Duplicate {
        section: String,
        what: &'static str,
        value: String,
    },
}

/// Rendering context: indentation of directive lines inside a section.
#[derive(Debug, Clone)]
pub struct Renderer {
    indent: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
        }
    }
}

impl Renderer {
    pub fn new(indent: impl Into<String>) -> Self {
        Self {
            indent: indent.into(),
        }
    }

    /// Render the whole configuration file.
    pub fn render(&self, configuration: &Configuration) -> Result<String, RenderError> {
        let mut blocks = Vec::new();

        if configuration.include_globals {
            blocks.push(sections::global(self, configuration)?);
        }
        if configuration.include_defaults {
            blocks.push(sections::defaults(self, configuration));
        }
        for frontend in configuration.frontends() {
            blocks.push(proxy::block(self, frontend)?);
        }
        for backend in configuration.backends() {
            blocks.push(proxy::block(self, backend)?);
        }

        if blocks.is_empty() {
            return Ok(String::new());
        }

        let mut text = blocks
            .iter()
            .map(|lines| lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n");
        text.push('\n');
        Ok(text)
    }

    /// One indented directive line.
    fn line(&self, directive: impl AsRef<str>) -> String {
        format!("{}{}", self.indent, directive.as_ref())
    }
}

/// Render with the default four-space indentation.
pub fn render(configuration: &Configuration) -> Result<String, RenderError> {
    Renderer::default().render(configuration)
}
