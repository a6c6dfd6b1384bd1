//! Exposed resource templates.

use serde::{Deserialize, Serialize};

use crate::routing::matcher;

/// A persisted resource owned by one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Surrogate key assigned by the store.
    pub id: u64,
    /// Globally unique external name.
    pub identifier: String,
    /// Path template, e.g. `/users/{id}`.
    pub path: String,
    /// Owning application id.
    #[serde(rename = "application")]
    pub application_id: String,
}

impl Resource {
    /// Returns true if `request_path` matches this resource's template.
    pub fn matches(&self, request_path: &str) -> bool {
        matcher::matches(&self.path, request_path)
    }
}

/// A resource as submitted in a deploy request, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub identifier: String,
    pub path: String,
}
