//! Adapter implementations for topic persistence.

pub mod memory;
pub mod postgres;
