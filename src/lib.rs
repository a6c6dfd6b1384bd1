//! Integrator Gateway Library

pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod proxy;
pub mod registry;
pub mod routing;
pub mod store;

pub use config::schema::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use registry::Registry;
