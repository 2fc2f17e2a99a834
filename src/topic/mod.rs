//! Topic lifecycle management.
//!
//! A topic is a conversation thread bound one-to-one to a chat-layer topic.
//! It owns the sequence of tasks run on the user's behalf and remembers the
//! sandbox those tasks ran in so later tasks can reuse it. This module covers
//! creating, renaming and deleting topics, including interrupting any task
//! still running before a topic goes away.
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
