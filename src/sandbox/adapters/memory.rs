//! In-memory sandbox adapters for tests and local orchestration runs.
//!
//! These adapters never open sockets. The gateway answers from a table of
//! known sandboxes and the connector hands out sessions whose replies are
//! scripted up front, so interrupt flows can be exercised deterministically.

use crate::sandbox::{
    domain::{GATEWAY_SUCCESS_CODE, SandboxId, SandboxProbe, SandboxStatus},
    ports::{
        SandboxConnector, SandboxGateway, SandboxGatewayError, SandboxGatewayResult,
        SandboxSession, SandboxSessionError, SandboxSessionResult,
    },
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// Gateway code reported for sandboxes missing from the table.
const NOT_FOUND_CODE: i64 = 4004;

/// In-memory sandbox gateway.
#[derive(Debug, Clone, Default)]
pub struct InMemorySandboxGateway {
    sandboxes: Arc<RwLock<HashMap<SandboxId, SandboxStatus>>>,
}

impl InMemorySandboxGateway {
    /// Creates a gateway that knows no sandboxes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or updates a sandbox and its runtime status.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn set_status(
        &self,
        sandbox_id: SandboxId,
        status: SandboxStatus,
    ) -> SandboxGatewayResult<()> {
        let mut sandboxes = self
            .sandboxes
            .write()
            .map_err(|err| SandboxGatewayError::request(std::io::Error::other(err.to_string())))?;
        sandboxes.insert(sandbox_id, status);
        Ok(())
    }
}

#[async_trait]
impl SandboxGateway for InMemorySandboxGateway {
    async fn check_sandbox_exists(
        &self,
        sandbox_id: &SandboxId,
    ) -> SandboxGatewayResult<SandboxProbe> {
        let sandboxes = self
            .sandboxes
            .read()
            .map_err(|err| SandboxGatewayError::request(std::io::Error::other(err.to_string())))?;
        Ok(sandboxes.get(sandbox_id).map_or_else(
            || SandboxProbe::not_found(NOT_FOUND_CODE),
            |status| SandboxProbe::new(GATEWAY_SUCCESS_CODE, Some(*status)),
        ))
    }

    async fn websocket_url(&self, sandbox_id: &SandboxId) -> SandboxGatewayResult<String> {
        Ok(format!("ws://sandbox.invalid/api/v1/sandboxes/ws/{sandbox_id}"))
    }
}

/// How scripted sessions answer after a frame is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    /// The first `receive` yields this frame.
    Acknowledge(Value),
    /// Every `receive` reports its wait as expired, without sleeping.
    Silent,
    /// `connect` fails before a session exists.
    RefuseConnection,
}

#[derive(Debug)]
struct ScriptedState {
    reply: ScriptedReply,
    connections: usize,
    closed_sessions: usize,
    sent: Vec<Value>,
}

/// Connector producing sessions with scripted replies.
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedConnector {
    /// Creates a connector whose sessions answer with `reply`.
    #[must_use]
    pub fn new(reply: ScriptedReply) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptedState {
                reply,
                connections: 0,
                closed_sessions: 0,
                sent: Vec::new(),
            })),
        }
    }

    /// Replaces the reply used by sessions opened from now on.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn set_reply(&self, reply: ScriptedReply) -> SandboxSessionResult<()> {
        lock(&self.state)?.reply = reply;
        Ok(())
    }

    /// Returns how many connections were attempted.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn connection_count(&self) -> SandboxSessionResult<usize> {
        Ok(lock(&self.state)?.connections)
    }

    /// Returns how many sessions were closed.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn closed_count(&self) -> SandboxSessionResult<usize> {
        Ok(lock(&self.state)?.closed_sessions)
    }

    /// Returns every payload sent across all sessions, in order.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn sent_payloads(&self) -> SandboxSessionResult<Vec<Value>> {
        Ok(lock(&self.state)?.sent.clone())
    }
}

#[async_trait]
impl SandboxConnector for ScriptedConnector {
    async fn connect(
        &self,
        url: &str,
        connect_timeout: Duration,
    ) -> SandboxSessionResult<Box<dyn SandboxSession>> {
        let reply = {
            let mut state = lock(&self.state)?;
            state.connections += 1;
            state.reply.clone()
        };
        if reply == ScriptedReply::RefuseConnection {
            return Err(SandboxSessionError::ConnectTimeout {
                url: url.to_owned(),
                timeout: connect_timeout,
            });
        }
        Ok(Box::new(ScriptedSession {
            state: Arc::clone(&self.state),
            pending: match reply {
                ScriptedReply::Acknowledge(frame) => Some(frame),
                ScriptedReply::Silent | ScriptedReply::RefuseConnection => None,
            },
            closed: false,
        }))
    }
}

struct ScriptedSession {
    state: Arc<Mutex<ScriptedState>>,
    pending: Option<Value>,
    closed: bool,
}

#[async_trait]
impl SandboxSession for ScriptedSession {
    async fn send(&mut self, payload: &Value) -> SandboxSessionResult<()> {
        if self.closed {
            return Err(SandboxSessionError::Closed);
        }
        lock(&self.state)?.sent.push(payload.clone());
        Ok(())
    }

    async fn receive(&mut self, _timeout: Duration) -> SandboxSessionResult<Option<Value>> {
        if self.closed {
            return Err(SandboxSessionError::Closed);
        }
        Ok(self.pending.take())
    }

    async fn close(&mut self) -> SandboxSessionResult<()> {
        if !self.closed {
            self.closed = true;
            lock(&self.state)?.closed_sessions += 1;
        }
        Ok(())
    }
}

fn lock(
    state: &Mutex<ScriptedState>,
) -> SandboxSessionResult<std::sync::MutexGuard<'_, ScriptedState>> {
    state
        .lock()
        .map_err(|err| SandboxSessionError::transport(std::io::Error::other(err.to_string())))
}
