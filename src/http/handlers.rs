//! Request handlers for the management and proxy surfaces.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::PROXY_AUTHORIZATION;
use crate::error::{GatewayError, GatewayResult};
use crate::http::server::AppState;
use crate::model::{Application, DeployRequest, FieldViolation, Resource, UndeployRequest};
use crate::proxy::ProxyRequest;

/// Path prefix of the proxy surface.
pub const PROXY_PREFIX: &str = "/proxy/";

/// Well-formed JSON with a mistyped field is reported in the violation list
/// under `body`; anything that is not JSON stays a plain body error.
fn body_error(rejection: JsonRejection) -> GatewayError {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            GatewayError::Validation(vec![FieldViolation::new("body", e.body_text())])
        }
        other => GatewayError::InvalidBody(other.body_text()),
    }
}

pub async fn deploy(
    State(state): State<AppState>,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> GatewayResult<Response> {
    let Json(request) = payload.map_err(body_error)?;
    let deployment = request.validate().map_err(GatewayError::Validation)?;

    let token = state.registry.deploy(deployment)?;
    let value =
        HeaderValue::from_str(&token).map_err(|e| GatewayError::Token(e.to_string()))?;

    Ok((StatusCode::OK, [(PROXY_AUTHORIZATION, value)]).into_response())
}

pub async fn undeploy(
    State(state): State<AppState>,
    payload: Result<Json<UndeployRequest>, JsonRejection>,
) -> GatewayResult<Json<serde_json::Value>> {
    let Json(request) = payload.map_err(body_error)?;
    let id = request.validate().map_err(GatewayError::Validation)?;

    state.registry.undeploy(&id)?;

    Ok(Json(json!({
        "message": format!("Application '{id}' undeployed.")
    })))
}

pub async fn list_applications(State(state): State<AppState>) -> Json<Vec<Application>> {
    Json(state.registry.find_all())
}

pub async fn list_resources(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> GatewayResult<Json<Vec<Resource>>> {
    Ok(Json(state.registry.find_resources_of(&id)?))
}

pub async fn find_resource(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> GatewayResult<Json<Resource>> {
    state
        .registry
        .find_resource_by_identifier(&identifier)?
        .map(Json)
        .ok_or(GatewayError::NotFound)
}

pub async fn status() -> Json<serde_json::Value> {
    Json(json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn proxy(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some((application_id, path)) = split_proxy_path(uri.path()) else {
        return GatewayError::NotFound.into_response();
    };

    let request = ProxyRequest {
        application_id,
        path,
        query: uri.query().map(str::to_string),
        method,
        headers,
        body,
    };
    state.dispatcher.execute(request).await
}

/// Split `/proxy/{application}/{rest}` into the application id and the
/// backend path. A missing rest stays empty, so `/proxy/app` resolves the
/// resource "" and `/proxy/app/` resolves "/".
pub fn split_proxy_path(raw: &str) -> Option<(String, String)> {
    let remainder = raw.strip_prefix(PROXY_PREFIX)?;
    let (application_id, path) = match remainder.find('/') {
        Some(index) => remainder.split_at(index),
        None => (remainder, ""),
    };
    if application_id.is_empty() {
        return None;
    }
    Some((application_id.to_string(), path.to_string()))
}
