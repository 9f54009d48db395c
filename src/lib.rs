//! harp: load-balancer configuration management.
//!
//! An in-memory model of HAProxy configurations, addressed through composite
//! ids, rendered deterministically to configuration text, and committed to
//! disk followed by an external reload.

// Core
pub mod keys;
pub mod model;
pub mod render;

// Side effects
pub mod commit;

// Management surface
pub mod admin;
pub mod catalog;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use catalog::{Catalog, CatalogError};
pub use commit::{CommitError, CommitReport, Committer};
pub use config::HarpConfig;
pub use http::HttpServer;
pub use model::{Configuration, Proxy, Server, Target};
pub use render::{render, RenderError, Renderer};
