//! Port contracts for sandbox connectivity.
//!
//! Ports define infrastructure-agnostic interfaces used by sandbox services.

pub mod gateway;
pub mod session;

pub use gateway::{SandboxGateway, SandboxGatewayError, SandboxGatewayResult};
pub use session::{SandboxConnector, SandboxSession, SandboxSessionError, SandboxSessionResult};
