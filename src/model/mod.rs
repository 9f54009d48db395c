//! Entity model subsystem.
//!
//! # Ownership
//! ```text
//! Configuration
//!     → Proxy (frontend | backend), name unique per configuration
//!         → ACL rows, (name, expression) unique per proxy
//!         → frontend: Target bindings, rank unique per frontend
//!         → backend: Server, name unique per backend
//! ```
//!
//! # Design Decisions
//! - Parents own their children in insertion-ordered `Vec`s; no back-pointers
//! - Identifying fields (names, ranks, required text) are private and only
//!   change through validating mutators
//! - Plain tuning attributes are public fields; they carry no invariants
//! - Deserialized entities bypass the mutators, so `validate()` re-checks the
//!   whole subtree before the catalog accepts it

pub mod acl;
pub mod configuration;
pub mod error;
pub mod proxy;
pub mod server;
pub mod target;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use acl::Acl;
pub use configuration::Configuration;
pub use error::{Constraint, ValidationError};
pub use proxy::{Backend, Frontend, Proxy, ProxyKind, ProxyOptions, ProxyType};
pub use server::{Server, ServerOptions};
pub use target::{Operator, Target};

/// Proxy operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Http,
    Tcp,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Http => write!(f, "http"),
            Mode::Tcp => write!(f, "tcp"),
        }
    }
}
