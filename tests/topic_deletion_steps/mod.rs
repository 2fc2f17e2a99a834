//! Step definitions for topic deletion scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
