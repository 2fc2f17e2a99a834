//! Repository port for workspace persistence.

use crate::isolation::DataIsolation;
use crate::workspace::domain::{Workspace, WorkspaceId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for workspace repository operations.
pub type WorkspaceRepositoryResult<T> = Result<T, WorkspaceRepositoryError>;

/// Workspace persistence contract.
///
/// Soft-deleted workspaces are invisible to every lookup.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Stores a new workspace.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceRepositoryError::DuplicateWorkspace`] when the
    /// identifier already exists.
    async fn store(&self, workspace: &Workspace) -> WorkspaceRepositoryResult<()>;

    /// Persists changes to an existing workspace.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceRepositoryError::NotFound`] when the workspace does
    /// not exist or is deleted.
    async fn update(&self, workspace: &Workspace) -> WorkspaceRepositoryResult<()>;

    /// Finds a live workspace by identifier.
    async fn find_by_id(&self, id: WorkspaceId) -> WorkspaceRepositoryResult<Option<Workspace>>;

    /// Lists the caller's live workspaces, oldest first.
    async fn list_by_owner(
        &self,
        isolation: &DataIsolation,
    ) -> WorkspaceRepositoryResult<Vec<Workspace>>;

    /// Soft-deletes a workspace.
    ///
    /// Returns `false` when no live workspace had the identifier.
    async fn soft_delete(
        &self,
        id: WorkspaceId,
        deleted_at: DateTime<Utc>,
    ) -> WorkspaceRepositoryResult<bool>;
}

/// Errors returned by workspace repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkspaceRepositoryError {
    /// A workspace with the same identifier already exists.
    #[error("duplicate workspace identifier: {0}")]
    DuplicateWorkspace(WorkspaceId),

    /// The workspace was not found.
    #[error("workspace not found: {0}")]
    NotFound(WorkspaceId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkspaceRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
