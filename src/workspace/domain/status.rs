//! Workspace archive and availability status.

use super::ParseWorkspaceStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a workspace has been archived by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveStatus {
    /// The workspace is in active use.
    #[default]
    NotArchived,
    /// The workspace is archived and read-only for new work.
    Archived,
}

impl ArchiveStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotArchived => "not_archived",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ArchiveStatus {
    type Error = ParseWorkspaceStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "not_archived" => Ok(Self::NotArchived),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseWorkspaceStatusError(value.to_owned())),
        }
    }
}

/// Administrative availability of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    /// The workspace is available.
    #[default]
    Active,
    /// The workspace has been disabled by an administrator.
    Disabled,
}

impl WorkspaceStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WorkspaceStatus {
    type Error = ParseWorkspaceStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            _ => Err(ParseWorkspaceStatusError(value.to_owned())),
        }
    }
}
