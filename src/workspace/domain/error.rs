//! Error types for workspace domain validation and parsing.

use super::WorkspaceId;
use thiserror::Error;

/// Errors returned while constructing or mutating workspaces.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkspaceDomainError {
    /// The workspace name is empty after trimming.
    #[error("workspace name must not be empty")]
    EmptyName,

    /// The workspace name exceeds the storage limit.
    #[error("workspace name exceeds {max} characters")]
    NameTooLong {
        /// Maximum allowed length in characters.
        max: usize,
    },

    /// The workspace is archived and rejects new topics and tasks.
    #[error("workspace {0} is archived")]
    Archived(WorkspaceId),
}

/// Error returned while parsing workspace status values from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown workspace status: {0}")]
pub struct ParseWorkspaceStatusError(pub String);
