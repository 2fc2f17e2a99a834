//! Domain model for sandbox connectivity.

mod error;
mod ids;
mod message;
mod status;

pub use error::SandboxDomainError;
pub use ids::SandboxId;
pub use message::{ControlMessage, SandboxMessageBuilder};
pub use status::{GATEWAY_SUCCESS_CODE, SandboxProbe, SandboxStatus};
