//! Gateway error taxonomy and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::model::FieldViolation;
use crate::store::StoreError;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors surfaced by the registry, the dispatcher and the HTTP handlers.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("validation failed ({} violations)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("Application '{0}' not deployed.")]
    NotDeployed(String),

    #[error("Proxy-Authorization header is required")]
    AuthorizationMissing,

    /// Mapped to 500, not 401/403: callers cannot distinguish a forged
    /// token from a gateway fault.
    #[error("Proxy-Authorization is invalid: {0}")]
    AuthorizationInvalid(String),

    #[error("not found")]
    NotFound,

    #[error("backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("resource identifier '{0}' is already registered")]
    DuplicateIdentifier(String),

    #[error("failed to issue proxy authorization: {0}")]
    Token(String),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("method {0} cannot be proxied")]
    MethodNotAllowed(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(identifier) => GatewayError::DuplicateIdentifier(identifier),
            other => GatewayError::Store(other),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            GatewayError::AuthorizationMissing => {
                StatusCode::PROXY_AUTHENTICATION_REQUIRED.into_response()
            }
            GatewayError::NotFound => StatusCode::NOT_FOUND.into_response(),
            other => {
                let status = match &other {
                    GatewayError::NotDeployed(_) => StatusCode::NOT_FOUND,
                    GatewayError::BackendUnreachable(_) => StatusCode::BAD_GATEWAY,
                    GatewayError::DuplicateIdentifier(_) => StatusCode::CONFLICT,
                    GatewayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
                    GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(error = %other, status = %status, "Request failed");
                }
                (status, Json(json!({ "error": other.to_string() }))).into_response()
            }
        }
    }
}
