//! Topic creation, maintenance and deletion.

use crate::isolation::DataIsolation;
use crate::task::domain::{Task, TaskMode, TaskStatus};
use crate::task::services::{TaskDomainService, TaskServiceError, UpdateTaskStatusRequest};
use crate::topic::{
    domain::{ChatBinding, ChatTopicId, Topic, TopicId, TopicName},
    ports::{TopicRepository, TopicRepositoryError},
};
use crate::workspace::{
    domain::{Workspace, WorkspaceDomainError, WorkspaceId},
    ports::{WorkspaceRepository, WorkspaceRepositoryError},
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for creating a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTopicRequest {
    workspace_id: WorkspaceId,
    chat: ChatBinding,
    name: TopicName,
    work_dir: Option<String>,
    task_mode: Option<TaskMode>,
    sandbox_config: Option<Value>,
}

impl CreateTopicRequest {
    /// Creates a request for a topic in `workspace_id` bound to `chat`.
    #[must_use]
    pub fn new(workspace_id: WorkspaceId, chat: ChatBinding) -> Self {
        Self {
            workspace_id,
            chat,
            name: TopicName::default(),
            work_dir: None,
            task_mode: None,
            sandbox_config: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: TopicName) -> Self {
        self.name = name;
        self
    }

    /// Overrides the derived working directory.
    #[must_use]
    pub fn with_work_dir(mut self, work_dir: impl Into<String>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    /// Sets the task mode remembered for the first task.
    #[must_use]
    pub const fn with_task_mode(mut self, task_mode: TaskMode) -> Self {
        self.task_mode = Some(task_mode);
        self
    }

    /// Sets the opaque sandbox configuration.
    #[must_use]
    pub fn with_sandbox_config(mut self, sandbox_config: Value) -> Self {
        self.sandbox_config = Some(sandbox_config);
        self
    }
}

/// Service-level errors for topic operations.
#[derive(Debug, Error)]
pub enum TopicServiceError {
    /// The workspace refused the change.
    #[error(transparent)]
    Workspace(#[from] WorkspaceDomainError),

    /// Topic repository operation failed.
    #[error(transparent)]
    Repository(#[from] TopicRepositoryError),

    /// Workspace repository operation failed.
    #[error(transparent)]
    WorkspaceRepository(#[from] WorkspaceRepositoryError),

    /// A task operation failed, including interrupt timeouts.
    #[error(transparent)]
    Task(#[from] TaskServiceError),

    /// The topic is absent or not owned by the caller.
    #[error("topic not found: {0}")]
    TopicNotFound(TopicId),

    /// The workspace is absent or not owned by the caller.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(WorkspaceId),
}

impl TopicServiceError {
    /// Returns `true` for errors meaning the target does not exist or is not
    /// visible to the caller.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::TopicNotFound(_) | Self::WorkspaceNotFound(_) => true,
            Self::Task(err) => err.is_not_found(),
            _ => false,
        }
    }
}

/// Result type for topic service operations.
pub type TopicServiceResult<T> = Result<T, TopicServiceError>;

/// Topic orchestration service.
///
/// Task-bearing rules, such as interrupting before deletion, are delegated
/// to [`TaskDomainService`].
#[derive(Clone)]
pub struct TopicDomainService<C>
where
    C: Clock + Send + Sync,
{
    topics: Arc<dyn TopicRepository>,
    workspaces: Arc<dyn WorkspaceRepository>,
    tasks: Arc<TaskDomainService<C>>,
    clock: Arc<C>,
}

impl<C> TopicDomainService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a new topic service.
    #[must_use]
    pub fn new(
        topics: Arc<dyn TopicRepository>,
        workspaces: Arc<dyn WorkspaceRepository>,
        tasks: Arc<TaskDomainService<C>>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            topics,
            workspaces,
            tasks,
            clock,
        }
    }

    /// Creates a topic and makes it the workspace's current topic.
    ///
    /// # Errors
    ///
    /// Returns [`TopicServiceError::WorkspaceNotFound`] for unknown
    /// workspaces, [`TopicServiceError::Workspace`] when the workspace is
    /// archived, and [`TopicServiceError::Repository`] when the chat topic is
    /// already bound.
    pub async fn create_topic(
        &self,
        isolation: &DataIsolation,
        request: CreateTopicRequest,
    ) -> TopicServiceResult<Topic> {
        let mut workspace = self.owned_workspace(isolation, request.workspace_id).await?;
        workspace.ensure_accepts_new_work()?;

        let mut topic = Topic::new(
            isolation,
            workspace.id(),
            request.chat,
            request.name,
            &*self.clock,
        );
        if let Some(work_dir) = request.work_dir {
            topic.set_work_dir(work_dir, &*self.clock);
        }
        if let Some(task_mode) = request.task_mode {
            topic.set_task_mode(task_mode, &*self.clock);
        }
        if let Some(sandbox_config) = request.sandbox_config {
            topic.set_sandbox_config(Some(sandbox_config), &*self.clock);
        }
        self.topics.store(&topic).await?;

        workspace.set_current_topic(Some(topic.id()), &*self.clock);
        self.workspaces.update(&workspace).await?;

        info!(
            topic_id = %topic.id(),
            workspace_id = %workspace.id(),
            chat_topic_id = %topic.chat().topic_id(),
            "created topic"
        );
        Ok(topic)
    }

    /// Renames a topic.
    ///
    /// # Errors
    ///
    /// Returns [`TopicServiceError::Workspace`] when the workspace is
    /// archived and [`TopicServiceError::TopicNotFound`] for unknown topics.
    pub async fn rename_topic(
        &self,
        isolation: &DataIsolation,
        topic_id: TopicId,
        name: TopicName,
    ) -> TopicServiceResult<Topic> {
        let mut topic = self.owned_topic(isolation, topic_id).await?;
        self.writable_workspace(&topic).await?;
        topic.rename(name, &*self.clock);
        self.topics.update(&topic).await?;
        Ok(topic)
    }

    /// Returns a topic owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TopicServiceError::TopicNotFound`] for unknown topics.
    pub async fn get_topic(
        &self,
        isolation: &DataIsolation,
        topic_id: TopicId,
    ) -> TopicServiceResult<Topic> {
        self.owned_topic(isolation, topic_id).await
    }

    /// Finds the caller's topic bound to a chat topic.
    ///
    /// # Errors
    ///
    /// Returns [`TopicServiceError::Repository`] when the lookup fails.
    pub async fn find_by_chat_topic_id(
        &self,
        isolation: &DataIsolation,
        chat_topic_id: &ChatTopicId,
    ) -> TopicServiceResult<Option<Topic>> {
        Ok(self
            .topics
            .find_by_chat_topic_id(isolation.user_id(), chat_topic_id)
            .await?
            .filter(|topic| topic.is_owned_by(isolation)))
    }

    /// Lists the live topics in a workspace owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TopicServiceError::WorkspaceNotFound`] for unknown
    /// workspaces.
    pub async fn list_topics(
        &self,
        isolation: &DataIsolation,
        workspace_id: WorkspaceId,
    ) -> TopicServiceResult<Vec<Topic>> {
        let workspace = self.owned_workspace(isolation, workspace_id).await?;
        Ok(self.topics.list_by_workspace(workspace.id()).await?)
    }

    /// Replaces the opaque sandbox configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TopicServiceError::TopicNotFound`] for unknown topics.
    pub async fn update_sandbox_config(
        &self,
        isolation: &DataIsolation,
        topic_id: TopicId,
        sandbox_config: Option<Value>,
    ) -> TopicServiceResult<Topic> {
        let mut topic = self.owned_topic(isolation, topic_id).await?;
        topic.set_sandbox_config(sandbox_config, &*self.clock);
        self.topics.update(&topic).await?;
        Ok(topic)
    }

    /// Interrupts the topic's running task and marks it stopped.
    ///
    /// Returns `None` when nothing was running.
    ///
    /// # Errors
    ///
    /// Returns [`TopicServiceError::Task`] wrapping
    /// [`TaskServiceError::InterruptTimeout`] when the sandbox does not
    /// answer; the task is left untouched in that case.
    pub async fn interrupt_topic_task(
        &self,
        isolation: &DataIsolation,
        topic_id: TopicId,
    ) -> TopicServiceResult<Option<Task>> {
        let topic = self.owned_topic(isolation, topic_id).await?;
        let Some(running) = self.tasks.find_running_task(isolation, topic.id()).await? else {
            return Ok(None);
        };

        self.tasks.handle_interrupt_instruction(&running).await?;
        let stopped = self
            .tasks
            .update_task_status(
                isolation,
                UpdateTaskStatusRequest::new(topic.id(), running.id(), TaskStatus::Stopped),
            )
            .await?;
        info!(topic_id = %topic.id(), task_id = %stopped.id(), "interrupted topic task");
        Ok(Some(stopped))
    }

    /// Deletes a topic and every task on it.
    ///
    /// A running task is interrupted first; if the sandbox cannot confirm,
    /// nothing is deleted. Returns the number of tasks soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns [`TopicServiceError::Task`] when the interrupt fails,
    /// [`TopicServiceError::Workspace`] when the workspace is archived, and
    /// [`TopicServiceError::TopicNotFound`] for unknown topics.
    pub async fn delete_topic(
        &self,
        isolation: &DataIsolation,
        topic_id: TopicId,
    ) -> TopicServiceResult<u64> {
        let topic = self.owned_topic(isolation, topic_id).await?;
        let mut workspace = self.writable_workspace(&topic).await?;

        if let Some(running) = self.tasks.find_running_task(isolation, topic.id()).await? {
            self.tasks.handle_interrupt_instruction(&running).await?;
        }

        let deleted_tasks = self.tasks.soft_delete_topic_tasks(topic.id()).await?;
        if !self.topics.soft_delete(topic.id(), self.clock.utc()).await? {
            return Err(TopicServiceError::TopicNotFound(topic.id()));
        }

        if workspace.current_topic_id() == Some(topic.id()) {
            workspace.set_current_topic(None, &*self.clock);
            self.workspaces.update(&workspace).await?;
        }

        info!(
            topic_id = %topic.id(),
            workspace_id = %workspace.id(),
            deleted_tasks,
            "deleted topic"
        );
        Ok(deleted_tasks)
    }

    async fn owned_topic(
        &self,
        isolation: &DataIsolation,
        topic_id: TopicId,
    ) -> TopicServiceResult<Topic> {
        self.topics
            .find_by_id(topic_id)
            .await?
            .filter(|topic| topic.is_owned_by(isolation))
            .ok_or(TopicServiceError::TopicNotFound(topic_id))
    }

    async fn owned_workspace(
        &self,
        isolation: &DataIsolation,
        workspace_id: WorkspaceId,
    ) -> TopicServiceResult<Workspace> {
        self.workspaces
            .find_by_id(workspace_id)
            .await?
            .filter(|workspace| workspace.is_owned_by(isolation))
            .ok_or(TopicServiceError::WorkspaceNotFound(workspace_id))
    }

    async fn writable_workspace(&self, topic: &Topic) -> TopicServiceResult<Workspace> {
        let workspace = self
            .workspaces
            .find_by_id(topic.workspace_id())
            .await?
            .ok_or(TopicServiceError::WorkspaceNotFound(topic.workspace_id()))?;
        workspace.ensure_accepts_new_work()?;
        Ok(workspace)
    }
}
