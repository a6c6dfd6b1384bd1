//! Proxy authorization.
//!
//! # Data Flow
//! ```text
//! Deploy:  (application id, secret) → token.rs issue → Proxy-Authorization header
//! Proxy:   Proxy-Authorization header → token.rs validate → claims (sub, nbf)
//! ```
//!
//! # Security
//! Validation inspects claims only. The HS256 signature is never verified
//! against a stored key because the gateway does not keep deploy secrets.
//! Any well-formed token with a subject and a past `nbf` is accepted.

pub mod token;

pub use token::{ProxyClaims, TokenAuthority, PROXY_AUTHORIZATION};
