//! Adapter implementations for sandbox ports.

pub mod http;
pub mod memory;
pub mod websocket;

pub use http::{HttpSandboxGateway, websocket_url_for};
pub use memory::{InMemorySandboxGateway, ScriptedConnector, ScriptedReply};
pub use websocket::{WebSocketConnector, WebSocketSession};
