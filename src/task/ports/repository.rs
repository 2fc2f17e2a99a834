//! Repository port for task persistence and conditional bulk updates.

use crate::task::domain::{ExternalTaskId, Task, TaskId, TaskStatus};
use crate::topic::domain::TopicId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Soft-deleted tasks are invisible to every lookup and bulk update.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or is deleted, and [`TaskRepositoryError::TopicBusy`] when the task
    /// would become a second running task on its topic.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a live task by internal identifier.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Finds a live task by the identifier its sandbox assigned.
    async fn find_by_external_id(
        &self,
        external_task_id: &ExternalTaskId,
    ) -> TaskRepositoryResult<Option<Task>>;

    /// Finds the live running task on a topic, if any.
    async fn find_running_by_topic(&self, topic_id: TopicId) -> TaskRepositoryResult<Option<Task>>;

    /// Lists live tasks on a topic, oldest first.
    async fn list_by_topic(&self, topic_id: TopicId) -> TaskRepositoryResult<Vec<Task>>;

    /// Sets the status of the live task with the given external identifier
    /// in a single write.
    ///
    /// Repeating the stored status still refreshes `updated_at`. Moving to
    /// running is refused inside the same write when another live task on
    /// the topic is already running. Returns `false` only when no live task
    /// matched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::InvalidTransition`] when the state
    /// machine forbids the change and [`TaskRepositoryError::TopicBusy`]
    /// when a sibling task is running.
    async fn update_status_by_external_id(
        &self,
        external_task_id: &ExternalTaskId,
        status: TaskStatus,
        updated_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool>;

    /// Moves every live running task last updated strictly before
    /// `threshold` to error in one conditional write, returning the count.
    ///
    /// The threshold is evaluated inside the write, so a task refreshed
    /// concurrently is left untouched.
    async fn mark_stale_running_as_error(
        &self,
        threshold: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<u64>;

    /// Soft-deletes a task.
    ///
    /// Returns `false` when no live task had the identifier.
    async fn soft_delete(&self, id: TaskId, deleted_at: DateTime<Utc>)
    -> TaskRepositoryResult<bool>;

    /// Soft-deletes every live task on a topic, returning the count.
    async fn soft_delete_by_topic(
        &self,
        topic_id: TopicId,
        deleted_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<u64>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A conditional status write was refused by the state machine.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Task whose status was being changed.
        task_id: TaskId,
        /// Stored status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// Another live task on the topic is already running.
    #[error("topic {topic_id} already runs task {running_task_id}")]
    TopicBusy {
        /// Topic with the running task.
        topic_id: TopicId,
        /// Task already running.
        running_task_id: TaskId,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
