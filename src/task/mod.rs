//! Task lifecycle management.
//!
//! A task is one unit of agent work on a topic, executed inside a sandbox.
//! This module covers creating tasks from inbound instructions, applying
//! status reports under the task state machine, interrupting running work,
//! reclaiming tasks whose sandbox went silent, registering produced files
//! idempotently by key and recording the task transcript. The module follows
//! hexagonal architecture:
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
