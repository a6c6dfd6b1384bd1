//! Registered backend application.

use serde::{Deserialize, Serialize};

/// A backend service registered under a short key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application key (1–10 chars), also the first proxy path segment.
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    /// Base URL of the backend, e.g. `http://10.0.0.4:8080`.
    pub host: String,
}

impl Application {
    /// Absolute URL for a resource path on this backend.
    pub fn target_url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}
