//! Workspace lifecycle management.
//!
//! A workspace is the tenant-owned container of topics. This module covers
//! creating workspaces on first use, renaming and archiving them, tracking
//! the current topic pointer, and deleting a workspace once none of its
//! topics has work running. The module follows hexagonal architecture:
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
