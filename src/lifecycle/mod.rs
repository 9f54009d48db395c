//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Seed catalog → Build shared state
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown of the API listener
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then catalog, then listener
//! - Fail fast: any startup error is fatal
//! - In-flight requests (including a running commit) finish before exit

pub mod signals;
pub mod startup;

pub use signals::shutdown_signal;
pub use startup::{build_state, StartupError};
