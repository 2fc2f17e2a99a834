//! In-memory append-only transcript.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{TaskId, TaskMessage},
    ports::{TaskMessageRepository, TaskMessageRepositoryError, TaskMessageRepositoryResult},
};

/// Thread-safe in-memory transcript kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskMessageRepository {
    messages: Arc<RwLock<Vec<TaskMessage>>>,
}

impl InMemoryTaskMessageRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> TaskMessageRepositoryError {
    TaskMessageRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskMessageRepository for InMemoryTaskMessageRepository {
    async fn append(&self, message: &TaskMessage) -> TaskMessageRepositoryResult<()> {
        let mut messages = self.messages.write().map_err(poisoned)?;
        messages.push(message.clone());
        Ok(())
    }

    async fn list_by_task(
        &self,
        task_id: TaskId,
    ) -> TaskMessageRepositoryResult<Vec<TaskMessage>> {
        let messages = self.messages.read().map_err(poisoned)?;
        Ok(messages
            .iter()
            .filter(|message| message.task_id() == task_id)
            .cloned()
            .collect())
    }
}
