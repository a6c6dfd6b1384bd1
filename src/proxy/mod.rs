//! Proxy dispatch.
//!
//! # Data Flow
//! ```text
//! /proxy/{application}/{path...}
//!     → dispatcher.rs (auth → route → forward → relay)
//!     → forward.rs (single parametrized outbound call per verb)
//!     → backend
//! ```
//!
//! # Design Decisions
//! - No retries; a forward failure is a 502
//! - Bodies are buffered; no streaming
//! - Redirects are relayed to the client, never followed

pub mod dispatcher;
pub mod forward;

pub use dispatcher::{DispatchState, Dispatcher, ProxyRequest};
pub use forward::{BackendResponse, Forwarder, Verb};
