//! Domain model.
//!
//! # Data Flow
//! ```text
//! POST /deploy (JSON)
//!     → request.rs (DeployRequest, field validation)
//!     → Deployment (validated Application + ResourceSpec[])
//!     → registry persists → Resource (with surrogate id)
//! ```
//!
//! # Design Decisions
//! - Wire payloads keep every field optional so that validation can report
//!   all violations at once instead of failing on the first missing field
//! - Domain types are immutable once built; a redeploy replaces them

pub mod application;
pub mod request;
pub mod resource;

pub use application::Application;
pub use request::{DeployRequest, Deployment, FieldViolation, UndeployRequest};
pub use resource::{Resource, ResourceSpec};
