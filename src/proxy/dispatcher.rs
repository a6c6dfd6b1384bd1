//! Per-request proxy dispatch.
//!
//! # State machine
//! ```text
//! AwaitingAuth → AuthValidated → RouteResolved → Forwarded → Completed
//!      │               │
//!      ▼               ▼
//! Unauthorized     NotFound
//! ```
//! A request whose token fails validation stops in `AwaitingAuth`; one
//! whose backend cannot be reached stops in `RouteResolved`.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};

use crate::auth::PROXY_AUTHORIZATION;
use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::proxy::forward::{outbound_headers, Forwarder, Verb};
use crate::registry::Registry;

const UNKNOWN_APPLICATION: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    AwaitingAuth,
    AuthValidated,
    RouteResolved,
    Forwarded,
    Completed,
    Unauthorized,
    NotFound,
}

impl DispatchState {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchState::AwaitingAuth => "awaiting_auth",
            DispatchState::AuthValidated => "auth_validated",
            DispatchState::RouteResolved => "route_resolved",
            DispatchState::Forwarded => "forwarded",
            DispatchState::Completed => "completed",
            DispatchState::Unauthorized => "unauthorized",
            DispatchState::NotFound => "not_found",
        }
    }

    /// Application label for request metrics. Only ids that resolved to a
    /// deployed application are used; anything earlier is `"unknown"` so
    /// client-supplied ids never create new label sets.
    pub fn metric_label(self, application_id: &str) -> &str {
        match self {
            DispatchState::RouteResolved | DispatchState::Forwarded | DispatchState::Completed => {
                application_id
            }
            _ => UNKNOWN_APPLICATION,
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inbound request addressed to a deployed application.
#[derive(Debug)]
pub struct ProxyRequest {
    pub application_id: String,
    /// Path below the application prefix. Empty for `/proxy/{application}`.
    pub path: String,
    pub query: Option<String>,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    forwarder: Forwarder,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, forwarder: Forwarder) -> Self {
        Self {
            registry,
            forwarder,
        }
    }

    /// Run `request` through the dispatch sequence and build the client
    /// response.
    pub async fn execute(&self, request: ProxyRequest) -> Response {
        let started = Instant::now();
        let application_id = request.application_id.clone();
        let path = request.path.clone();

        let mut state = DispatchState::AwaitingAuth;
        let response = match self.dispatch(request, &mut state).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        };
        let status = response.status();

        tracing::debug!(
            application = %application_id,
            path = %path,
            state = %state,
            status = status.as_u16(),
            "Proxy request finished"
        );
        metrics::record_proxy_request(
            state.metric_label(&application_id),
            state.as_str(),
            status.as_u16(),
            started.elapsed(),
        );

        response
    }

    pub(crate) async fn dispatch(
        &self,
        request: ProxyRequest,
        state: &mut DispatchState,
    ) -> GatewayResult<Response> {
        let Some(token) = request.headers.get(PROXY_AUTHORIZATION) else {
            *state = DispatchState::Unauthorized;
            return Err(GatewayError::AuthorizationMissing);
        };
        let token = token
            .to_str()
            .map_err(|e| GatewayError::AuthorizationInvalid(e.to_string()))?;
        self.registry.tokens().validate(token)?;
        *state = DispatchState::AuthValidated;

        let Some(application) = self.registry.find_application(&request.application_id) else {
            *state = DispatchState::NotFound;
            return Err(GatewayError::NotFound);
        };
        if !self
            .registry
            .resource_exists(&application.id, &request.path)?
        {
            *state = DispatchState::NotFound;
            return Err(GatewayError::NotFound);
        }
        *state = DispatchState::RouteResolved;

        let verb = Verb::from_method(&request.method)
            .ok_or_else(|| GatewayError::MethodNotAllowed(request.method.to_string()))?;

        let mut target = application.target_url(&request.path);
        if let Some(query) = request.query.as_deref().filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }

        tracing::debug!(
            application = %application.id,
            method = %request.method,
            target = %target,
            "Forwarding request"
        );
        let backend = self
            .forwarder
            .forward(&target, verb, outbound_headers(&request.headers), request.body)
            .await?;
        *state = DispatchState::Forwarded;

        let response = backend.into_relayed();
        *state = DispatchState::Completed;
        Ok(response)
    }
}
