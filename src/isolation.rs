//! Tenant isolation context shared by every bounded context.
//!
//! Callers resolve authentication and authorization before reaching the
//! orchestration core; the resolved identity travels through services as a
//! [`DataIsolation`] value and is stamped onto every record created on the
//! caller's behalf.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors returned while constructing isolation values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IsolationError {
    /// The user identifier is empty after trimming.
    #[error("user id must not be empty")]
    EmptyUserId,

    /// The organization code is empty after trimming.
    #[error("organization code must not be empty")]
    EmptyOrganizationCode,
}

/// Identifier of a platform user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a validated user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IsolationError::EmptyUserId`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, IsolationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IsolationError::EmptyUserId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Code of the organization a user acts within.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationCode(String);

impl OrganizationCode {
    /// Creates a validated organization code.
    ///
    /// # Errors
    ///
    /// Returns [`IsolationError::EmptyOrganizationCode`] when the value is
    /// blank.
    pub fn new(value: impl Into<String>) -> Result<Self, IsolationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IsolationError::EmptyOrganizationCode);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OrganizationCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for OrganizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trusted caller identity resolved by the upstream layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataIsolation {
    user_id: UserId,
    organization_code: OrganizationCode,
}

impl DataIsolation {
    /// Creates an isolation context from validated parts.
    #[must_use]
    pub const fn new(user_id: UserId, organization_code: OrganizationCode) -> Self {
        Self {
            user_id,
            organization_code,
        }
    }

    /// Creates an isolation context from raw strings.
    ///
    /// # Errors
    ///
    /// Returns [`IsolationError`] when either part is blank.
    pub fn from_parts(
        user_id: impl Into<String>,
        organization_code: impl Into<String>,
    ) -> Result<Self, IsolationError> {
        Ok(Self::new(
            UserId::new(user_id)?,
            OrganizationCode::new(organization_code)?,
        ))
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the acting organization.
    #[must_use]
    pub const fn organization_code(&self) -> &OrganizationCode {
        &self.organization_code
    }

    /// Returns `true` when the record identified by `owner` and
    /// `organization` belongs to this caller.
    #[must_use]
    pub fn owns(&self, owner: &UserId, organization: &OrganizationCode) -> bool {
        &self.user_id == owner && &self.organization_code == organization
    }
}
