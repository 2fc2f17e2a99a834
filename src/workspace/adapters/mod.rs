//! Adapter implementations for workspace persistence.

pub mod memory;
pub mod postgres;
