//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with key/value fields (entity ids, paths, programs)
//!
//! logging.rs installs the subscriber once per process:
//!     → RUST_LOG when set, else [observability].log_level
//!     → human-readable or JSON lines on stderr, keeping stdout for rendered output
//! ```
//!
//! # Design Decisions
//! - Structured fields over formatted messages for machine parsing
//! - Request ID comes from the HTTP layer and appears in the access log span
//! - Library code never installs a subscriber; binaries do

pub mod logging;

pub use logging::init;
