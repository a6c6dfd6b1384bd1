use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub host: String,
}

/// A resource as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: u64,
    pub identifier: String,
    pub path: String,
    /// Owning application id.
    pub application: String,
}

/// A resource to register on deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub identifier: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRequest {
    pub application: Application,
    pub secret: String,
    pub resources: Vec<ResourceDefinition>,
}

impl DeployRequest {
    pub fn new(application: Application, secret: impl Into<String>) -> Self {
        Self {
            application,
            secret: secret.into(),
            resources: Vec::new(),
        }
    }

    pub fn resource(mut self, identifier: impl Into<String>, path: impl Into<String>) -> Self {
        self.resources.push(ResourceDefinition {
            identifier: identifier.into(),
            path: path.into(),
        });
        self
    }
}
