//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, routes)
//!     → request.rs (request ID generation)
//!     → handlers.rs (deploy, undeploy, directory, status, proxy)
//!     → registry / proxy dispatcher
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, GatewayServer};
