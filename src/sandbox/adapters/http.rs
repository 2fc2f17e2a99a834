//! HTTP client for the sandbox gateway.

use crate::config::SandboxGatewayConfig;
use crate::sandbox::{
    domain::{SandboxId, SandboxProbe, SandboxStatus},
    ports::{SandboxGateway, SandboxGatewayError, SandboxGatewayResult},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

/// Header carrying the gateway API token.
const TOKEN_HEADER: &str = "token";

/// Response envelope used by every gateway endpoint.
#[derive(Debug, Deserialize)]
struct GatewayEnvelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<SandboxData>,
}

#[derive(Debug, Deserialize)]
struct SandboxData {
    #[serde(default)]
    status: Option<String>,
}

/// `reqwest`-backed sandbox gateway client.
#[derive(Debug, Clone)]
pub struct HttpSandboxGateway {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpSandboxGateway {
    /// Creates a gateway client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxGatewayError::InvalidBaseUrl`] when the base URL is
    /// not an `http(s)` URL, or [`SandboxGatewayError::Request`] when the HTTP
    /// client cannot be built.
    pub fn new(config: &SandboxGatewayConfig) -> SandboxGatewayResult<Self> {
        let base_url = parse_base_url(&config.gateway_base_url)?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(SandboxGatewayError::request)?;
        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    fn status_url(&self, sandbox_id: &SandboxId) -> SandboxGatewayResult<Url> {
        endpoint(&self.base_url, &["api", "v1", "sandboxes", sandbox_id.as_str()])
    }
}

#[async_trait]
impl SandboxGateway for HttpSandboxGateway {
    async fn check_sandbox_exists(
        &self,
        sandbox_id: &SandboxId,
    ) -> SandboxGatewayResult<SandboxProbe> {
        let mut request = self.client.get(self.status_url(sandbox_id)?);
        if let Some(token) = &self.api_token {
            request = request.header(TOKEN_HEADER, token);
        }
        let response = request.send().await.map_err(SandboxGatewayError::request)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(SandboxProbe::not_found(i64::from(status.as_u16())));
        }
        if !status.is_success() {
            return Err(SandboxGatewayError::UnexpectedStatus {
                sandbox_id: sandbox_id.clone(),
                status: status.as_u16(),
            });
        }

        let envelope = response
            .json::<GatewayEnvelope>()
            .await
            .map_err(SandboxGatewayError::request)?;
        debug!(
            sandbox_id = %sandbox_id,
            code = envelope.code,
            message = envelope.message.as_deref().unwrap_or_default(),
            "sandbox gateway probe"
        );
        let sandbox_status = envelope
            .data
            .and_then(|data| data.status)
            .map(|value| SandboxStatus::from_wire(&value));
        Ok(SandboxProbe::new(envelope.code, sandbox_status))
    }

    async fn websocket_url(&self, sandbox_id: &SandboxId) -> SandboxGatewayResult<String> {
        websocket_url_from(self.base_url.clone(), sandbox_id)
    }
}

/// Derives the WebSocket endpoint of a sandbox from the gateway base URL.
///
/// `http` maps to `ws` and `https` to `wss`. A path prefix on the base URL
/// is kept.
///
/// # Errors
///
/// Returns [`SandboxGatewayError::InvalidBaseUrl`] when the base URL is not
/// an `http(s)` URL.
pub fn websocket_url_for(base_url: &str, sandbox_id: &SandboxId) -> SandboxGatewayResult<String> {
    websocket_url_from(parse_base_url(base_url)?, sandbox_id)
}

fn websocket_url_from(mut url: Url, sandbox_id: &SandboxId) -> SandboxGatewayResult<String> {
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|()| SandboxGatewayError::InvalidBaseUrl(url.to_string()))?;
    let ws_url = endpoint(&url, &["api", "v1", "sandboxes", "ws", sandbox_id.as_str()])?;
    Ok(ws_url.into())
}

fn parse_base_url(base_url: &str) -> SandboxGatewayResult<Url> {
    let invalid = || SandboxGatewayError::InvalidBaseUrl(base_url.to_owned());
    let url = Url::parse(base_url.trim()).map_err(|_| invalid())?;
    let is_http = matches!(url.scheme(), "http" | "https");
    if !is_http || url.host_str().is_none_or(str::is_empty) {
        return Err(invalid());
    }
    Ok(url)
}

/// Appends `segments` to the path of `base`, escaping each one.
fn endpoint(base: &Url, segments: &[&str]) -> SandboxGatewayResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| SandboxGatewayError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
