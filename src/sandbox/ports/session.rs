//! Session port for the sandbox WebSocket transport.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for sandbox session operations.
pub type SandboxSessionResult<T> = Result<T, SandboxSessionError>;

/// Opens sessions to sandbox WebSocket endpoints.
#[async_trait]
pub trait SandboxConnector: Send + Sync {
    /// Connects to `url`, giving up after `connect_timeout`.
    async fn connect(
        &self,
        url: &str,
        connect_timeout: Duration,
    ) -> SandboxSessionResult<Box<dyn SandboxSession>>;
}

/// One open connection to a sandbox.
///
/// A session is owned by exactly one operation and must be closed by it.
#[async_trait]
pub trait SandboxSession: Send {
    /// Sends one JSON document as a text frame.
    async fn send(&mut self, payload: &Value) -> SandboxSessionResult<()>;

    /// Waits up to `timeout` for the next data frame.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    async fn receive(&mut self, timeout: Duration) -> SandboxSessionResult<Option<Value>>;

    /// Closes the connection. Closing an already closed session succeeds.
    async fn close(&mut self) -> SandboxSessionResult<()>;
}

/// Errors returned by sandbox session adapters.
#[derive(Debug, Clone, Error)]
pub enum SandboxSessionError {
    /// The connection was not established within the connect timeout.
    #[error("connecting to {url} timed out after {timeout:?}")]
    ConnectTimeout {
        /// Endpoint being dialled.
        url: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The peer closed the connection.
    #[error("sandbox session closed by peer")]
    Closed,

    /// A payload could not be encoded or decoded.
    #[error("sandbox session codec error: {0}")]
    Codec(Arc<dyn std::error::Error + Send + Sync>),

    /// The underlying transport failed.
    #[error("sandbox session transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl SandboxSessionError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Wraps a codec error.
    pub fn codec(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Codec(Arc::new(err))
    }
}
