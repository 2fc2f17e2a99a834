//! Repository port for task file registration.

use crate::task::domain::{FileKey, TaskFile, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task file repository operations.
pub type TaskFileRepositoryResult<T> = Result<T, TaskFileRepositoryError>;

/// Task file persistence contract.
///
/// Storage enforces at most one live file per file key.
#[async_trait]
pub trait TaskFileRepository: Send + Sync {
    /// Inserts `file` unless a live file with the same key exists.
    ///
    /// Returns `true` when this call inserted the row and `false` when a
    /// concurrent producer got there first.
    async fn insert_or_ignore(&self, file: &TaskFile) -> TaskFileRepositoryResult<bool>;

    /// Finds the live file registered under `file_key`.
    async fn find_by_file_key(&self, file_key: &FileKey)
    -> TaskFileRepositoryResult<Option<TaskFile>>;

    /// Lists live files registered by a task, oldest first.
    async fn list_by_task(&self, task_id: TaskId) -> TaskFileRepositoryResult<Vec<TaskFile>>;
}

/// Errors returned by task file repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskFileRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskFileRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
