//! Registration payloads and their validation.
//!
//! # Responsibilities
//! - Deserialize deploy/undeploy bodies without failing on missing fields
//! - Check every field constraint and collect all violations
//! - Produce a validated `Deployment` for the registry
//!
//! # Design Decisions
//! - Validation returns every violation with its field path (`resources[1].path`)
//! - Lengths are counted in characters, not bytes

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::{Application, ResourceSpec};

const ID_MAX: usize = 10;
const NAME_MAX: usize = 20;
const DESCRIPTION_MAX: usize = 100;
const VERSION_MAX: usize = 20;
const HOST_MAX: usize = 200;
const IDENTIFIER_MAX: usize = 200;
const PATH_MAX: usize = 200;

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Application section of a registration payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationPayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub host: Option<String>,
}

/// Resource entry of a deploy payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourcePayload {
    pub identifier: Option<String>,
    pub path: Option<String>,
}

/// Body of `POST /deploy`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployRequest {
    pub application: Option<ApplicationPayload>,
    pub secret: Option<String>,
    /// `null` and a missing list both mean no resources.
    pub resources: Option<Vec<ResourcePayload>>,
}

/// Body of `POST /undeploy`. Only `application.id` is read.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UndeployRequest {
    pub application: Option<ApplicationPayload>,
}

/// A validated deploy request.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub application: Application,
    /// Signing secret for the issued token. Never persisted.
    pub secret: String,
    pub resources: Vec<ResourceSpec>,
}

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    /// Required text field with a length range of `1..=max` characters.
    fn text(&mut self, field: &str, value: Option<String>, max: usize) -> String {
        match value {
            None => {
                self.0.push(FieldViolation::new(field, "must not be null"));
                String::new()
            }
            Some(v) => {
                let len = v.chars().count();
                if len == 0 || len > max {
                    self.0.push(FieldViolation::new(
                        field,
                        format!("size must be between 1 and {}", max),
                    ));
                }
                v
            }
        }
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldViolation>> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.0)
        }
    }
}

/// Returns true for absolute `http`/`https` URLs that name a host.
fn is_valid_host(host: &str) -> bool {
    match Url::parse(host) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().map(|h| !h.is_empty()).unwrap_or(false)
        }
        Err(_) => false,
    }
}

impl DeployRequest {
    /// Validate every field, returning all violations on failure.
    pub fn validate(self) -> Result<Deployment, Vec<FieldViolation>> {
        let mut violations = Violations::default();

        let application = match self.application {
            Some(payload) => Some(validate_application(&mut violations, payload)),
            None => {
                violations.push("application", "must not be null");
                None
            }
        };

        let secret = match self.secret {
            Some(s) if !s.is_empty() => s,
            Some(_) => {
                violations.push("secret", "must not be empty");
                String::new()
            }
            None => {
                violations.push("secret", "must not be null");
                String::new()
            }
        };

        let resources = validate_resources(&mut violations, self.resources.unwrap_or_default());

        match application {
            Some(application) => violations.finish(Deployment {
                application,
                secret,
                resources,
            }),
            None => Err(violations.0),
        }
    }
}

fn validate_application(violations: &mut Violations, payload: ApplicationPayload) -> Application {
    let id = violations.text("application.id", payload.id, ID_MAX);
    let name = violations.text("application.name", payload.name, NAME_MAX);
    let description =
        violations.text("application.description", payload.description, DESCRIPTION_MAX);
    let version = violations.text("application.version", payload.version, VERSION_MAX);
    let host = violations.text("application.host", payload.host, HOST_MAX);
    if !host.is_empty() && !is_valid_host(&host) {
        violations.push(
            "application.host",
            "must be an http:// or https:// URL with a host and optional port",
        );
    }

    Application {
        id,
        name,
        description,
        version,
        host,
    }
}

fn validate_resources(
    violations: &mut Violations,
    resources: Vec<ResourcePayload>,
) -> Vec<ResourceSpec> {
    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(resources.len());

    for (i, payload) in resources.into_iter().enumerate() {
        let identifier_field = format!("resources[{}].identifier", i);
        let identifier = violations.text(&identifier_field, payload.identifier, IDENTIFIER_MAX);
        let path = violations.text(&format!("resources[{}].path", i), payload.path, PATH_MAX);

        if !identifier.is_empty() && !seen.insert(identifier.clone()) {
            violations.push(identifier_field, "identifier is repeated in this request");
        }

        specs.push(ResourceSpec { identifier, path });
    }

    specs
}

impl UndeployRequest {
    /// Extract the application id to undeploy.
    pub fn validate(self) -> Result<String, Vec<FieldViolation>> {
        let mut violations = Violations::default();
        let id = match self.application {
            Some(payload) => violations.text("application.id", payload.id, ID_MAX),
            None => {
                violations.push("application", "must not be null");
                String::new()
            }
        };
        violations.finish(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> DeployRequest {
        serde_json::from_value(serde_json::json!({
            "application": {
                "id": "app-v3",
                "name": "app",
                "description": "application v3",
                "version": "3.0.0",
                "host": "http://app-v3.com"
            },
            "secret": "secret",
            "resources": [{ "identifier": "resource-app", "path": "/app/v1" }]
        }))
        .unwrap()
    }

    fn fields(violations: &[FieldViolation]) -> Vec<&str> {
        violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn test_valid_request_produces_deployment() {
        let deployment = valid_request().validate().unwrap();
        assert_eq!(deployment.application.id, "app-v3");
        assert_eq!(deployment.secret, "secret");
        assert_eq!(
            deployment.resources,
            vec![ResourceSpec {
                identifier: "resource-app".into(),
                path: "/app/v1".into()
            }]
        );
    }

    #[test]
    fn test_reports_every_violation() {
        let request: DeployRequest = serde_json::from_value(serde_json::json!({
            "application": {
                "id": "an-id-that-is-too-long",
                "name": "",
                "version": "1",
                "host": "ftp://files"
            },
            "resources": [{ "identifier": "r" }]
        }))
        .unwrap();

        let violations = request.validate().unwrap_err();
        assert_eq!(
            fields(&violations),
            vec![
                "application.id",
                "application.name",
                "application.description",
                "application.host",
                "secret",
                "resources[0].path",
            ]
        );
    }

    #[test]
    fn test_missing_application() {
        let request: DeployRequest =
            serde_json::from_value(serde_json::json!({ "secret": "s" })).unwrap();
        let violations = request.validate().unwrap_err();
        assert_eq!(fields(&violations), vec!["application"]);
    }

    #[test]
    fn test_duplicate_identifier_in_request() {
        let mut request = valid_request();
        request.resources.get_or_insert_with(Vec::new).push(ResourcePayload {
            identifier: Some("resource-app".into()),
            path: Some("/app/v2".into()),
        });
        let violations = request.validate().unwrap_err();
        assert_eq!(fields(&violations), vec!["resources[1].identifier"]);
    }

    #[test]
    fn test_null_resources_means_none() {
        let mut body = serde_json::to_value(valid_request()).unwrap();
        body["resources"] = serde_json::Value::Null;
        let request: DeployRequest = serde_json::from_value(body).unwrap();

        let deployment = request.validate().unwrap();
        assert!(deployment.resources.is_empty());
    }

    #[test]
    fn test_host_pattern() {
        assert!(is_valid_host("http://app-v3.com"));
        assert!(is_valid_host("https://10.0.0.1:8443/base"));
        assert!(!is_valid_host("app-v3.com"));
        assert!(!is_valid_host("ftp://app-v3.com"));
    }

    #[test]
    fn test_undeploy_requires_id() {
        let ok: UndeployRequest =
            serde_json::from_value(serde_json::json!({ "application": { "id": "app" } })).unwrap();
        assert_eq!(ok.validate().unwrap(), "app");

        let missing: UndeployRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(fields(&missing.validate().unwrap_err()), vec!["application"]);
    }
}
