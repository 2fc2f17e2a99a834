//! Repository port for the append-only task transcript.

use crate::task::domain::{TaskId, TaskMessage};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task message repository operations.
pub type TaskMessageRepositoryResult<T> = Result<T, TaskMessageRepositoryError>;

/// Append-only transcript persistence contract.
#[async_trait]
pub trait TaskMessageRepository: Send + Sync {
    /// Appends a transcript entry. Identical content is never rejected.
    async fn append(&self, message: &TaskMessage) -> TaskMessageRepositoryResult<()>;

    /// Lists a task's transcript in insertion order.
    async fn list_by_task(&self, task_id: TaskId)
    -> TaskMessageRepositoryResult<Vec<TaskMessage>>;
}

/// Errors returned by task message repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskMessageRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskMessageRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
