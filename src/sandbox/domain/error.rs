//! Error types for sandbox domain validation.

use thiserror::Error;

/// Errors returned while constructing sandbox domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SandboxDomainError {
    /// The sandbox identifier is empty after trimming.
    #[error("sandbox id must not be empty")]
    EmptySandboxId,

    /// The sandbox identifier contains characters that cannot appear in a
    /// gateway path segment.
    #[error("invalid sandbox id '{0}'")]
    InvalidSandboxId(String),
}
