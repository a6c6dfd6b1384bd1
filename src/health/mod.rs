//! Backend liveness and eviction.
//!
//! # Data Flow
//! ```text
//! Eviction (eviction.rs):
//!     Periodic timer
//!     → Registry::evict_unreachable
//!     → liveness.rs probe per registered application
//!     → failed probe ⇒ undeploy
//!
//! Liveness probe (liveness.rs):
//!     host → TCP connect (bounded) → GET {host}/status (bounded) → bool
//! ```
//!
//! # Design Decisions
//! - Probes never run on the traffic path
//! - A single failed probe evicts; there is no flap threshold
//! - Malformed hosts fail closed

pub mod eviction;
pub mod liveness;

pub use eviction::EvictionMonitor;
pub use liveness::LivenessChecker;
