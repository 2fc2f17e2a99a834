//! Gateway port for sandbox liveness and endpoint discovery.

use crate::sandbox::domain::{SandboxId, SandboxProbe};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for sandbox gateway operations.
pub type SandboxGatewayResult<T> = Result<T, SandboxGatewayError>;

/// Sandbox gateway contract.
#[async_trait]
pub trait SandboxGateway: Send + Sync {
    /// Probes whether the sandbox exists and reports its runtime status.
    ///
    /// A sandbox the gateway does not know about is reported through the
    /// probe's response code, not as an error.
    async fn check_sandbox_exists(&self, sandbox_id: &SandboxId)
    -> SandboxGatewayResult<SandboxProbe>;

    /// Resolves the WebSocket endpoint for the sandbox.
    async fn websocket_url(&self, sandbox_id: &SandboxId) -> SandboxGatewayResult<String>;
}

/// Errors returned by sandbox gateway adapters.
#[derive(Debug, Clone, Error)]
pub enum SandboxGatewayError {
    /// The configured gateway base URL cannot be used.
    #[error("invalid sandbox gateway base URL '{0}', expected http:// or https://")]
    InvalidBaseUrl(String),

    /// The gateway answered with an unexpected HTTP status.
    #[error("sandbox gateway returned HTTP {status} for sandbox {sandbox_id}")]
    UnexpectedStatus {
        /// Sandbox the request was about.
        sandbox_id: SandboxId,
        /// HTTP status code returned by the gateway.
        status: u16,
    },

    /// The HTTP exchange with the gateway failed.
    #[error("sandbox gateway request failed: {0}")]
    Request(Arc<dyn std::error::Error + Send + Sync>),
}

impl SandboxGatewayError {
    /// Wraps a transport or decoding error.
    pub fn request(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Request(Arc::new(err))
    }
}
