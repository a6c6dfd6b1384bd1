//! Client for the integrator gateway.
//!
//! Backends use it to register themselves; callers use it to reach them
//! through the proxy surface.

pub mod client;
pub mod model;

pub use client::{IntegratorClient, SdkError};
pub use model::{Application, DeployRequest, Resource, ResourceDefinition};
