//! Workspace creation, maintenance and cascading deletion.

use crate::isolation::DataIsolation;
use crate::task::services::{TaskDomainService, TaskServiceError};
use crate::topic::{
    domain::TopicId,
    ports::{TopicRepository, TopicRepositoryError},
};
use crate::workspace::{
    domain::{
        ArchiveStatus, Workspace, WorkspaceDomainError, WorkspaceId, WorkspaceName,
        WorkspaceStatus,
    },
    ports::{WorkspaceRepository, WorkspaceRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Name given to the workspace created on a user's first request.
pub const DEFAULT_WORKSPACE_NAME: &str = "Default workspace";

/// Service-level errors for workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] WorkspaceDomainError),

    /// Workspace repository operation failed.
    #[error(transparent)]
    Repository(#[from] WorkspaceRepositoryError),

    /// Topic repository operation failed.
    #[error(transparent)]
    TopicRepository(#[from] TopicRepositoryError),

    /// A task operation failed.
    #[error(transparent)]
    Task(#[from] TaskServiceError),

    /// The workspace is absent or not owned by the caller.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(WorkspaceId),

    /// The topic is absent, not owned by the caller or in another workspace.
    #[error("topic not found: {0}")]
    TopicNotFound(TopicId),

    /// Topics in the workspace still have work running.
    #[error("workspace {workspace_id} has running topics: {topic_ids:?}")]
    WorkspaceHasRunningTopics {
        /// Workspace that was to be deleted.
        workspace_id: WorkspaceId,
        /// Topics with a running task.
        topic_ids: Vec<TopicId>,
    },
}

impl WorkspaceServiceError {
    /// Returns `true` for errors meaning the target does not exist or is not
    /// visible to the caller.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::WorkspaceNotFound(_) | Self::TopicNotFound(_) => true,
            Self::Task(err) => err.is_not_found(),
            _ => false,
        }
    }
}

/// Result type for workspace service operations.
pub type WorkspaceServiceResult<T> = Result<T, WorkspaceServiceError>;

/// Counts of records soft-deleted by [`WorkspaceDomainService::delete_workspace`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkspaceDeletion {
    /// Topics soft-deleted with the workspace.
    pub topics: u64,
    /// Tasks soft-deleted across those topics.
    pub tasks: u64,
}

/// Workspace orchestration service.
#[derive(Clone)]
pub struct WorkspaceDomainService<C>
where
    C: Clock + Send + Sync,
{
    workspaces: Arc<dyn WorkspaceRepository>,
    topics: Arc<dyn TopicRepository>,
    tasks: Arc<TaskDomainService<C>>,
    clock: Arc<C>,
}

impl<C> WorkspaceDomainService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a new workspace service.
    #[must_use]
    pub fn new(
        workspaces: Arc<dyn WorkspaceRepository>,
        topics: Arc<dyn TopicRepository>,
        tasks: Arc<TaskDomainService<C>>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            workspaces,
            topics,
            tasks,
            clock,
        }
    }

    /// Returns the caller's oldest workspace, creating one on first use.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::Repository`] when the lookup or
    /// insert fails.
    pub async fn ensure_default_workspace(
        &self,
        isolation: &DataIsolation,
    ) -> WorkspaceServiceResult<Workspace> {
        let existing = self.workspaces.list_by_owner(isolation).await?;
        if let Some(workspace) = existing.into_iter().next() {
            return Ok(workspace);
        }
        self.create_workspace(isolation, WorkspaceName::new(DEFAULT_WORKSPACE_NAME)?)
            .await
    }

    /// Creates a workspace for the caller.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::Repository`] when the insert fails.
    pub async fn create_workspace(
        &self,
        isolation: &DataIsolation,
        name: WorkspaceName,
    ) -> WorkspaceServiceResult<Workspace> {
        let workspace = Workspace::new(isolation, name, &*self.clock);
        self.workspaces.store(&workspace).await?;
        info!(
            workspace_id = %workspace.id(),
            user_id = %isolation.user_id(),
            "created workspace"
        );
        Ok(workspace)
    }

    /// Renames a workspace.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::WorkspaceNotFound`] for unknown
    /// workspaces.
    pub async fn rename_workspace(
        &self,
        isolation: &DataIsolation,
        workspace_id: WorkspaceId,
        name: WorkspaceName,
    ) -> WorkspaceServiceResult<Workspace> {
        let mut workspace = self.owned_workspace(isolation, workspace_id).await?;
        workspace.rename(name, &*self.clock);
        self.workspaces.update(&workspace).await?;
        Ok(workspace)
    }

    /// Archives or restores a workspace.
    ///
    /// Work already running is left alone; only new topics and tasks are
    /// refused while archived.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::WorkspaceNotFound`] for unknown
    /// workspaces.
    pub async fn set_archive_status(
        &self,
        isolation: &DataIsolation,
        workspace_id: WorkspaceId,
        archive_status: ArchiveStatus,
    ) -> WorkspaceServiceResult<Workspace> {
        let mut workspace = self.owned_workspace(isolation, workspace_id).await?;
        workspace.set_archive_status(archive_status, &*self.clock);
        self.workspaces.update(&workspace).await?;
        info!(
            workspace_id = %workspace.id(),
            archive_status = %archive_status,
            "changed workspace archive status"
        );
        Ok(workspace)
    }

    /// Enables or disables a workspace.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::WorkspaceNotFound`] for unknown
    /// workspaces.
    pub async fn set_workspace_status(
        &self,
        isolation: &DataIsolation,
        workspace_id: WorkspaceId,
        status: WorkspaceStatus,
    ) -> WorkspaceServiceResult<Workspace> {
        let mut workspace = self.owned_workspace(isolation, workspace_id).await?;
        workspace.set_status(status, &*self.clock);
        self.workspaces.update(&workspace).await?;
        Ok(workspace)
    }

    /// Points the workspace at one of its topics, or clears the pointer.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::TopicNotFound`] when the topic is not
    /// a live topic of this workspace owned by the caller.
    pub async fn set_current_topic(
        &self,
        isolation: &DataIsolation,
        workspace_id: WorkspaceId,
        topic_id: Option<TopicId>,
    ) -> WorkspaceServiceResult<Workspace> {
        let mut workspace = self.owned_workspace(isolation, workspace_id).await?;
        if let Some(requested) = topic_id {
            self.topics
                .find_by_id(requested)
                .await?
                .filter(|topic| {
                    topic.is_owned_by(isolation) && topic.workspace_id() == workspace.id()
                })
                .ok_or(WorkspaceServiceError::TopicNotFound(requested))?;
        }
        workspace.set_current_topic(topic_id, &*self.clock);
        self.workspaces.update(&workspace).await?;
        Ok(workspace)
    }

    /// Returns a workspace owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::WorkspaceNotFound`] for unknown
    /// workspaces.
    pub async fn get_workspace(
        &self,
        isolation: &DataIsolation,
        workspace_id: WorkspaceId,
    ) -> WorkspaceServiceResult<Workspace> {
        self.owned_workspace(isolation, workspace_id).await
    }

    /// Lists the caller's live workspaces, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::Repository`] when the lookup fails.
    pub async fn list_workspaces(
        &self,
        isolation: &DataIsolation,
    ) -> WorkspaceServiceResult<Vec<Workspace>> {
        Ok(self.workspaces.list_by_owner(isolation).await?)
    }

    /// Deletes a workspace together with its topics and their tasks.
    ///
    /// Nothing is deleted while any topic has a running task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::WorkspaceHasRunningTopics`] listing
    /// the busy topics, and [`WorkspaceServiceError::WorkspaceNotFound`] for
    /// unknown workspaces.
    pub async fn delete_workspace(
        &self,
        isolation: &DataIsolation,
        workspace_id: WorkspaceId,
    ) -> WorkspaceServiceResult<WorkspaceDeletion> {
        let workspace = self.owned_workspace(isolation, workspace_id).await?;
        let topics = self.topics.list_by_workspace(workspace.id()).await?;

        let mut running = Vec::new();
        for topic in &topics {
            if self
                .tasks
                .find_running_task(isolation, topic.id())
                .await?
                .is_some()
            {
                running.push(topic.id());
            }
        }
        if !running.is_empty() {
            return Err(WorkspaceServiceError::WorkspaceHasRunningTopics {
                workspace_id: workspace.id(),
                topic_ids: running,
            });
        }

        let mut deletion = WorkspaceDeletion::default();
        for topic in &topics {
            deletion.tasks += self.tasks.soft_delete_topic_tasks(topic.id()).await?;
        }
        let deleted_at = self.clock.utc();
        deletion.topics = self
            .topics
            .soft_delete_by_workspace(workspace.id(), deleted_at)
            .await?;
        if !self.workspaces.soft_delete(workspace.id(), deleted_at).await? {
            return Err(WorkspaceServiceError::WorkspaceNotFound(workspace.id()));
        }

        info!(
            workspace_id = %workspace.id(),
            topics = deletion.topics,
            tasks = deletion.tasks,
            "deleted workspace"
        );
        Ok(deletion)
    }

    async fn owned_workspace(
        &self,
        isolation: &DataIsolation,
        workspace_id: WorkspaceId,
    ) -> WorkspaceServiceResult<Workspace> {
        self.workspaces
            .find_by_id(workspace_id)
            .await?
            .filter(|workspace| workspace.is_owned_by(isolation))
            .ok_or(WorkspaceServiceError::WorkspaceNotFound(workspace_id))
    }
}
