use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use crate::model::{Application, DeployRequest, Resource};

const PROXY_AUTHORIZATION: &str = "proxy-authorization";

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned error status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("gateway response carried no proxy-authorization header")]
    MissingToken,
}

pub struct IntegratorClient {
    client: Client,
    gateway_url: String,
}

impl IntegratorClient {
    pub fn new(gateway_url: &str) -> Self {
        Self {
            client: Client::new(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    /// Register an application and return its proxy-authorization token.
    pub async fn deploy(&self, request: &DeployRequest) -> Result<String, SdkError> {
        let resp = self
            .client
            .post(format!("{}/deploy", self.gateway_url))
            .json(request)
            .send()
            .await?;
        let resp = check(resp).await?;

        resp.headers()
            .get(PROXY_AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(SdkError::MissingToken)
    }

    /// Remove an application. Returns the gateway's confirmation message.
    pub async fn undeploy(&self, id: &str) -> Result<String, SdkError> {
        let resp = self
            .client
            .post(format!("{}/undeploy", self.gateway_url))
            .json(&json!({ "application": { "id": id } }))
            .send()
            .await?;
        let body: Value = check(resp).await?.json().await?;
        Ok(body["message"].as_str().unwrap_or_default().to_string())
    }

    pub async fn applications(&self) -> Result<Vec<Application>, SdkError> {
        self.get_json("/applications").await
    }

    pub async fn resources(&self, application_id: &str) -> Result<Vec<Resource>, SdkError> {
        self.get_json(&format!("/applications/{application_id}/resources"))
            .await
    }

    /// Look up one resource by identifier; `None` when the gateway has none.
    pub async fn resource(&self, identifier: &str) -> Result<Option<Resource>, SdkError> {
        let resp = self
            .client
            .get(format!(
                "{}/applications/resources/{identifier}",
                self.gateway_url
            ))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(resp).await?.json().await?))
    }

    pub async fn status(&self) -> Result<Value, SdkError> {
        self.get_json("/status").await
    }

    /// Send a request through the proxy surface. The raw response is
    /// returned whatever its status.
    pub async fn proxy(
        &self,
        method: Method,
        application_id: &str,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Response, reqwest::Error> {
        let mut request = self.client.request(
            method,
            format!("{}/proxy/{application_id}{path}", self.gateway_url),
        );
        if let Some(token) = token {
            request = request.header(PROXY_AUTHORIZATION, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SdkError> {
        let resp = self
            .client
            .get(format!("{}{}", self.gateway_url, path))
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}

async fn check(resp: Response) -> Result<Response, SdkError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SdkError::Status { status, body })
}
