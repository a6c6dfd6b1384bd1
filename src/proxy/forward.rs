//! Outbound forwarding to application backends.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{GatewayError, GatewayResult};

/// Inbound headers never copied to the backend.
static REQUEST_DENY_LIST: [header::HeaderName; 3] = [
    header::CONTENT_LENGTH,
    header::HOST,
    header::TRANSFER_ENCODING,
];

/// Backend headers recomputed for the relayed response.
static RESPONSE_DENY_LIST: [header::HeaderName; 3] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

/// Verbs accepted on the proxy surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Verb::Get),
            Method::POST => Some(Verb::Post),
            Method::PUT => Some(Verb::Put),
            Method::PATCH => Some(Verb::Patch),
            Method::DELETE => Some(Verb::Delete),
            _ => None,
        }
    }

    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }

    /// GET never forwards a body.
    pub fn carries_body(self) -> bool {
        !matches!(self, Verb::Get)
    }
}

/// A fully buffered backend response.
#[derive(Debug)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl BackendResponse {
    /// Relay to the client. A backend 404 becomes a bare 404 and an empty
    /// JSON object body becomes an empty body.
    pub fn into_relayed(self) -> Response {
        if self.status == StatusCode::NOT_FOUND {
            return StatusCode::NOT_FOUND.into_response();
        }

        let body = if is_empty_object(&self.body) {
            Body::empty()
        } else {
            Body::from(self.body)
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = strip(self.headers, &RESPONSE_DENY_LIST);
        response
    }
}

/// Copy of `inbound` without the framing headers.
pub fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    strip(inbound.clone(), &REQUEST_DENY_LIST)
}

fn strip(mut headers: HeaderMap, deny: &[header::HeaderName]) -> HeaderMap {
    for name in deny {
        headers.remove(name);
    }
    headers
}

/// True when `body` is a JSON object with no members.
pub fn is_empty_object(body: &[u8]) -> bool {
    matches!(
        serde_json::from_slice::<serde_json::Value>(body),
        Ok(serde_json::Value::Object(map)) if map.is_empty()
    )
}

/// Sends requests to backends.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Forward one request. The body is sent only when `verb` carries one
    /// and it is non-empty.
    pub async fn forward(
        &self,
        target: &str,
        verb: Verb,
        headers: HeaderMap,
        body: Bytes,
    ) -> GatewayResult<BackendResponse> {
        let mut request = self.client.request(verb.method(), target).headers(headers);
        if verb.carries_body() && !body.is_empty() {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::BackendUnreachable(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::BackendUnreachable(e.to_string()))?;

        Ok(BackendResponse {
            status,
            headers,
            body,
        })
    }
}
