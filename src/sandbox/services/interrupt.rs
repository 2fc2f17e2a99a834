//! Interrupt handshake with a sandbox.
//!
//! The WebSocket channel is a bidirectional stream, but interrupting is
//! constrained to one exchange: send a single control frame, wait for a
//! single reply, close. Callers such as topic deletion need a definite
//! answer before they touch their own state.

use crate::isolation::UserId;
use crate::sandbox::{
    domain::{SandboxId, SandboxMessageBuilder},
    ports::{
        SandboxConnector, SandboxGateway, SandboxGatewayError, SandboxSession, SandboxSessionError,
    },
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// How long the handshake waits for the sandbox to acknowledge.
pub const INTERRUPT_ACK_TIMEOUT: Duration = Duration::from_secs(60);

/// How an interrupt request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// No sandbox was bound, so there was nothing to interrupt.
    NoSandbox,
    /// The sandbox is gone or not running; the work is already over.
    SandboxNotRunning,
    /// The sandbox received the interrupt and answered.
    Acknowledged,
}

impl InterruptOutcome {
    /// Returns `true` when the interrupted work is known to be stopped.
    #[must_use]
    pub const fn is_satisfied(self) -> bool {
        !matches!(self, Self::NoSandbox)
    }
}

/// Errors raised by the interrupt handshake.
#[derive(Debug, Clone, Error)]
pub enum InterruptError {
    /// The gateway could not be queried.
    #[error(transparent)]
    Gateway(#[from] SandboxGatewayError),

    /// The session failed to connect, send or receive.
    #[error(transparent)]
    Session(#[from] SandboxSessionError),

    /// The interrupt frame could not be encoded.
    #[error("failed to encode interrupt message: {0}")]
    Encode(String),

    /// The sandbox did not answer in time; its state is unknown.
    #[error("sandbox {sandbox_id} did not acknowledge interrupt within {waited:?}")]
    Timeout {
        /// Sandbox that stayed silent.
        sandbox_id: SandboxId,
        /// How long the handshake waited.
        waited: Duration,
    },
}

/// Drives the interrupt handshake through the gateway and a session.
#[derive(Clone)]
pub struct InterruptDispatcher {
    gateway: Arc<dyn SandboxGateway>,
    connector: Arc<dyn SandboxConnector>,
    connect_timeout: Duration,
}

impl InterruptDispatcher {
    /// Creates a dispatcher; `connect_timeout` bounds session setup.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn SandboxGateway>,
        connector: Arc<dyn SandboxConnector>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            connector,
            connect_timeout,
        }
    }

    /// Asks the sandbox running `task_id` to stop.
    ///
    /// # Errors
    ///
    /// Returns [`InterruptError::Timeout`] when no reply arrives within
    /// [`INTERRUPT_ACK_TIMEOUT`], and gateway or session errors when the
    /// sandbox cannot be reached.
    pub async fn interrupt(
        &self,
        bound_sandbox: Option<&SandboxId>,
        user_id: &UserId,
        task_id: &str,
    ) -> Result<InterruptOutcome, InterruptError> {
        let Some(sandbox_id) = bound_sandbox else {
            debug!(task_id, "no sandbox bound, nothing to interrupt");
            return Ok(InterruptOutcome::NoSandbox);
        };

        let probe = self.gateway.check_sandbox_exists(sandbox_id).await?;
        if !probe.is_running() {
            info!(
                sandbox_id = %sandbox_id,
                task_id,
                code = probe.code(),
                status = probe.status().map_or("missing", |status| status.as_str()),
                "sandbox not running, interrupt already satisfied"
            );
            return Ok(InterruptOutcome::SandboxNotRunning);
        }

        let url = self.gateway.websocket_url(sandbox_id).await?;
        let payload = SandboxMessageBuilder::interrupt(user_id, task_id)
            .to_payload()
            .map_err(|err| InterruptError::Encode(err.to_string()))?;

        let mut session = self.connector.connect(&url, self.connect_timeout).await?;
        let exchanged = exchange(session.as_mut(), &payload).await;
        if let Err(err) = session.close().await {
            warn!(sandbox_id = %sandbox_id, error = %err, "failed to close sandbox session");
        }

        match exchanged? {
            Some(reply) => {
                let reply_type = reply.get("type").and_then(Value::as_str).unwrap_or("unknown");
                info!(
                    sandbox_id = %sandbox_id,
                    task_id,
                    reply_type,
                    "sandbox acknowledged interrupt"
                );
                Ok(InterruptOutcome::Acknowledged)
            }
            None => {
                warn!(sandbox_id = %sandbox_id, task_id, "sandbox interrupt timed out");
                Err(InterruptError::Timeout {
                    sandbox_id: sandbox_id.clone(),
                    waited: INTERRUPT_ACK_TIMEOUT,
                })
            }
        }
    }
}

async fn exchange(
    session: &mut dyn SandboxSession,
    payload: &Value,
) -> Result<Option<Value>, SandboxSessionError> {
    session.send(payload).await?;
    session.receive(INTERRUPT_ACK_TIMEOUT).await
}
