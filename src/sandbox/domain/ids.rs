//! Identifier types for sandbox containers.

use super::SandboxDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a sandbox container, assigned by the sandbox gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SandboxId(String);

impl SandboxId {
    /// Creates a validated sandbox identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxDomainError::EmptySandboxId`] for blank values and
    /// [`SandboxDomainError::InvalidSandboxId`] when the value contains
    /// whitespace or path separators.
    pub fn new(value: impl Into<String>) -> Result<Self, SandboxDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SandboxDomainError::EmptySandboxId);
        }
        if trimmed
            .chars()
            .any(|ch| ch.is_whitespace() || ch == '/' || ch == '?' || ch == '#')
        {
            return Err(SandboxDomainError::InvalidSandboxId(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Parses an optional persisted value, treating blank strings as unset.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxDomainError::InvalidSandboxId`] when a non-blank value
    /// is malformed.
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, SandboxDomainError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(present) => Self::new(present).map(Some),
        }
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SandboxId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SandboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
