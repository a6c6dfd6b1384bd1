//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger → HTTP server stops accepting and drains
//!             → eviction monitor exits its loop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store and registry, then listeners
//! - Ordered shutdown: stop accept, drain, tear down registry

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
