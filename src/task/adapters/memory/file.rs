//! In-memory task file repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{FileKey, TaskFile, TaskFileId, TaskId},
    ports::{TaskFileRepository, TaskFileRepositoryError, TaskFileRepositoryResult},
};

/// Thread-safe in-memory task file repository.
///
/// A key index mirrors the partial unique index on live file keys.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskFileRepository {
    state: Arc<RwLock<InMemoryTaskFileState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskFileState {
    files: HashMap<TaskFileId, TaskFile>,
    key_index: HashMap<FileKey, TaskFileId>,
}

impl InMemoryTaskFileRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored file rows.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn row_count(&self) -> TaskFileRepositoryResult<usize> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.files.len())
    }
}

fn poisoned(err: impl std::fmt::Display) -> TaskFileRepositoryError {
    TaskFileRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskFileRepository for InMemoryTaskFileRepository {
    async fn insert_or_ignore(&self, file: &TaskFile) -> TaskFileRepositoryResult<bool> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.key_index.contains_key(file.file_key()) || state.files.contains_key(&file.id()) {
            return Ok(false);
        }
        state.key_index.insert(file.file_key().clone(), file.id());
        state.files.insert(file.id(), file.clone());
        Ok(true)
    }

    async fn find_by_file_key(
        &self,
        file_key: &FileKey,
    ) -> TaskFileRepositoryResult<Option<TaskFile>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .key_index
            .get(file_key)
            .and_then(|id| state.files.get(id))
            .filter(|file| file.deleted_at().is_none())
            .cloned())
    }

    async fn list_by_task(&self, task_id: TaskId) -> TaskFileRepositoryResult<Vec<TaskFile>> {
        let state = self.state.read().map_err(poisoned)?;
        let mut files: Vec<TaskFile> = state
            .files
            .values()
            .filter(|file| file.deleted_at().is_none() && file.task_id() == task_id)
            .cloned()
            .collect();
        files.sort_by_key(TaskFile::created_at);
        Ok(files)
    }
}
