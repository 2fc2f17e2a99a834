//! Thread-safe in-memory workspace repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::isolation::DataIsolation;
use crate::workspace::{
    domain::{Workspace, WorkspaceId},
    ports::{WorkspaceRepository, WorkspaceRepositoryError, WorkspaceRepositoryResult},
};

/// Thread-safe in-memory workspace repository.
///
/// Deleted workspaces are retained with their deletion marker so tests can
/// inspect them through [`Self::find_including_deleted`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkspaceRepository {
    workspaces: Arc<RwLock<HashMap<WorkspaceId, Workspace>>>,
}

impl InMemoryWorkspaceRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a workspace whether or not it has been soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn find_including_deleted(
        &self,
        id: WorkspaceId,
    ) -> WorkspaceRepositoryResult<Option<Workspace>> {
        let workspaces = self.workspaces.read().map_err(poisoned)?;
        Ok(workspaces.get(&id).cloned())
    }
}

fn poisoned(err: impl std::fmt::Display) -> WorkspaceRepositoryError {
    WorkspaceRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl WorkspaceRepository for InMemoryWorkspaceRepository {
    async fn store(&self, workspace: &Workspace) -> WorkspaceRepositoryResult<()> {
        let mut workspaces = self.workspaces.write().map_err(poisoned)?;
        if workspaces.contains_key(&workspace.id()) {
            return Err(WorkspaceRepositoryError::DuplicateWorkspace(workspace.id()));
        }
        workspaces.insert(workspace.id(), workspace.clone());
        Ok(())
    }

    async fn update(&self, workspace: &Workspace) -> WorkspaceRepositoryResult<()> {
        let mut workspaces = self.workspaces.write().map_err(poisoned)?;
        let existing = workspaces
            .get_mut(&workspace.id())
            .filter(|existing| existing.deleted_at().is_none())
            .ok_or(WorkspaceRepositoryError::NotFound(workspace.id()))?;
        *existing = workspace.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: WorkspaceId) -> WorkspaceRepositoryResult<Option<Workspace>> {
        let workspaces = self.workspaces.read().map_err(poisoned)?;
        Ok(workspaces
            .get(&id)
            .filter(|workspace| workspace.deleted_at().is_none())
            .cloned())
    }

    async fn list_by_owner(
        &self,
        isolation: &DataIsolation,
    ) -> WorkspaceRepositoryResult<Vec<Workspace>> {
        let workspaces = self.workspaces.read().map_err(poisoned)?;
        let mut owned: Vec<Workspace> = workspaces
            .values()
            .filter(|workspace| {
                workspace.deleted_at().is_none() && workspace.is_owned_by(isolation)
            })
            .cloned()
            .collect();
        owned.sort_by_key(Workspace::created_at);
        Ok(owned)
    }

    async fn soft_delete(
        &self,
        id: WorkspaceId,
        deleted_at: DateTime<Utc>,
    ) -> WorkspaceRepositoryResult<bool> {
        let mut workspaces = self.workspaces.write().map_err(poisoned)?;
        match workspaces
            .get_mut(&id)
            .filter(|workspace| workspace.deleted_at().is_none())
        {
            Some(workspace) => {
                workspace.mark_deleted(deleted_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
