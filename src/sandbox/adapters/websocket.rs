//! `tokio-tungstenite` implementation of the sandbox session port.

use crate::sandbox::ports::{
    SandboxConnector, SandboxSession, SandboxSessionError, SandboxSessionResult,
};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

type SandboxStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials sandbox WebSocket endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Creates a connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SandboxConnector for WebSocketConnector {
    async fn connect(
        &self,
        url: &str,
        connect_timeout: Duration,
    ) -> SandboxSessionResult<Box<dyn SandboxSession>> {
        let (stream, _) = tokio::time::timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| SandboxSessionError::ConnectTimeout {
                url: url.to_owned(),
                timeout: connect_timeout,
            })?
            .map_err(SandboxSessionError::transport)?;
        debug!(url, "sandbox session connected");
        Ok(Box::new(WebSocketSession { stream }))
    }
}

/// Open WebSocket connection to a sandbox.
pub struct WebSocketSession {
    stream: SandboxStream,
}

#[async_trait]
impl SandboxSession for WebSocketSession {
    async fn send(&mut self, payload: &Value) -> SandboxSessionResult<()> {
        let text = serde_json::to_string(payload).map_err(SandboxSessionError::codec)?;
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(SandboxSessionError::transport)
    }

    async fn receive(&mut self, timeout: Duration) -> SandboxSessionResult<Option<Value>> {
        let deadline = Instant::now() + timeout;
        loop {
            let Ok(next) = tokio::time::timeout_at(deadline, self.stream.next()).await else {
                return Ok(None);
            };
            match next {
                Some(Ok(Message::Text(text))) => return Ok(Some(decode_text(text))),
                Some(Ok(Message::Binary(bytes))) => {
                    let value = serde_json::from_slice(&bytes).map_err(SandboxSessionError::codec)?;
                    return Ok(Some(value));
                }
                Some(Ok(Message::Close(_))) | None => return Err(SandboxSessionError::Closed),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Err(err)) => return Err(SandboxSessionError::transport(err)),
            }
        }
    }

    async fn close(&mut self) -> SandboxSessionResult<()> {
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(err) => Err(SandboxSessionError::transport(err)),
        }
    }
}

/// Sandboxes answer with JSON; anything else is kept verbatim as a string.
fn decode_text(text: String) -> Value {
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}
