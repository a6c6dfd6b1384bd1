//! Resource routing.
//!
//! # Data Flow
//! ```text
//! Proxied request path (e.g. /users/42)
//!     → registry exact (application, path) lookup
//!     → on miss: matcher.rs against every template of the application
//!     → Return: resource exists or NotFound
//! ```
//!
//! # Design Decisions
//! - Templates are plain strings; `{name}` segments are single-segment wildcards
//! - No regex in the hot path
//! - Callers supply normalized paths; no trailing-slash folding

pub mod matcher;

pub use matcher::{matches, PathTemplate};
