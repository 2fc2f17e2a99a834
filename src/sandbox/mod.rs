//! Sandbox connectivity for task orchestration.
//!
//! Tasks execute inside external sandbox containers. This module owns the
//! narrow surface the orchestration core needs from them: a gateway client
//! that probes liveness and resolves WebSocket endpoints, a WebSocket session
//! with bounded connect and receive waits, the control-message builder, and
//! the interrupt handshake that ties them together.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
