//! Atelier: task orchestration core for sandboxed AI agents.
//!
//! The crate tracks the work an AI agent performs on a user's behalf.
//! Users own workspaces; each workspace holds topics bound one-to-one to a
//! chat-layer conversation thread; each topic runs a sequence of tasks
//! inside an external sandbox container. The core owns the task state
//! machine, idempotent file registration, the append-only transcript, the
//! interrupt handshake with the sandbox and the sweep that reclaims tasks
//! whose sandbox stopped reporting.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, APIs, etc.)
//! - **Services**: Orchestration over ports, generic over the clock
//!
//! # Modules
//!
//! - [`workspace`]: Tenant-owned containers of topics
//! - [`topic`]: Conversation threads and their deletion protocol
//! - [`task`]: Task lifecycle, files and transcript
//! - [`sandbox`]: Gateway client, WebSocket session and interrupts
//! - [`isolation`]: Caller identity stamped onto every record
//! - [`config`] and [`telemetry`]: Runtime configuration and logging
//! - [`postgres`]: Shared connection pool plumbing

pub mod config;
pub mod isolation;
pub mod postgres;
pub mod sandbox;
pub mod task;
pub mod telemetry;
pub mod topic;
pub mod workspace;

#[cfg(test)]
mod test_support;
