//! Two-stage reachability probe for application hosts.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tokio::net::TcpStream;
use tokio::time;

use crate::config::LivenessConfig;

const DEFAULT_PORT: u16 = 80;

/// Probes an application host with a TCP connect followed by `GET /status`.
#[derive(Debug, Clone)]
pub struct LivenessChecker {
    client: reqwest::Client,
    connect_timeout: Duration,
    status_timeout: Duration,
}

impl LivenessChecker {
    pub fn new(config: &LivenessConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .user_agent("integrator-gateway-liveness")
            .build()?;

        Ok(Self {
            client,
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            status_timeout: Duration::from_millis(config.status_timeout_ms),
        })
    }

    /// True only when both stages succeed.
    pub async fn probe(&self, host: &str) -> bool {
        let Some((hostname, port)) = parse_target(host) else {
            tracing::warn!(host = %host, "Liveness probe failed: malformed host");
            return false;
        };

        match time::timeout(self.connect_timeout, TcpStream::connect((hostname.as_str(), port)))
            .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::warn!(host = %host, error = %e, "Liveness probe failed: connection error");
                return false;
            }
            Err(_) => {
                tracing::warn!(host = %host, "Liveness probe failed: connect timeout");
                return false;
            }
        }

        let response = self
            .client
            .get(format!("{host}/status"))
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.status_timeout)
            .send()
            .await;

        match response {
            Ok(response) if response.status() == reqwest::StatusCode::OK => true,
            Ok(response) => {
                tracing::warn!(host = %host, status = %response.status(), "Liveness probe failed: non-OK status");
                false
            }
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Liveness probe failed: status request error");
                false
            }
        }
    }
}

/// Split `host` into hostname and port.
///
/// Accepts an optional `http://` or `https://` prefix and an optional
/// trailing path. The port defaults to 80 for either scheme.
pub fn parse_target(host: &str) -> Option<(String, u16)> {
    let rest = host
        .strip_prefix("http://")
        .or_else(|| host.strip_prefix("https://"))
        .unwrap_or(host);
    let authority = rest.split('/').next().unwrap_or_default();

    let (hostname, port) = match authority.rsplit_once(':') {
        Some((name, port)) => (name, port.parse::<u16>().ok()?),
        None => (authority, DEFAULT_PORT),
    };

    let valid = !hostname.is_empty()
        && hostname
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    valid.then(|| (hostname.to_string(), port))
}
