//! In-memory repository for task lifecycle tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{ExternalTaskId, Task, TaskDomainError, TaskId, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use crate::topic::domain::TopicId;

/// Thread-safe in-memory task repository.
///
/// Every operation holds the lock for its whole read-modify-write, which
/// gives bulk updates the same atomicity as a single SQL statement.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a task whether or not it has been soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn find_including_deleted(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks.get(&id).cloned())
    }

    /// Returns every task on a topic, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn all_for_topic(&self, topic_id: TopicId) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        let mut found: Vec<Task> = tasks
            .values()
            .filter(|task| task.topic_id() == topic_id)
            .cloned()
            .collect();
        found.sort_by_key(Task::created_at);
        Ok(found)
    }
}

fn poisoned(err: impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn is_live(task: &Task) -> bool {
    task.deleted_at().is_none()
}

/// Refuses to let `task_id` join another live running task on `topic_id`.
fn ensure_topic_idle(
    tasks: &HashMap<TaskId, Task>,
    topic_id: TopicId,
    task_id: TaskId,
) -> TaskRepositoryResult<()> {
    let sibling = tasks.values().find(|other| {
        is_live(other)
            && other.topic_id() == topic_id
            && other.is_running()
            && other.id() != task_id
    });
    match sibling {
        Some(running) => Err(TaskRepositoryError::TopicBusy {
            topic_id,
            running_task_id: running.id(),
        }),
        None => Ok(()),
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        if tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        if task.is_running() {
            ensure_topic_idle(&tasks, task.topic_id(), task.id())?;
        }
        let existing = tasks
            .get_mut(&task.id())
            .filter(|existing| is_live(existing))
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        *existing = task.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks.get(&id).filter(|task| is_live(task)).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_task_id: &ExternalTaskId,
    ) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks
            .values()
            .find(|task| is_live(task) && task.external_task_id() == Some(external_task_id))
            .cloned())
    }

    async fn find_running_by_topic(&self, topic_id: TopicId) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks
            .values()
            .filter(|task| is_live(task) && task.topic_id() == topic_id && task.is_running())
            .max_by_key(|task| task.created_at())
            .cloned())
    }

    async fn list_by_topic(&self, topic_id: TopicId) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        let mut found: Vec<Task> = tasks
            .values()
            .filter(|task| is_live(task) && task.topic_id() == topic_id)
            .cloned()
            .collect();
        found.sort_by_key(Task::created_at);
        Ok(found)
    }

    async fn update_status_by_external_id(
        &self,
        external_task_id: &ExternalTaskId,
        status: TaskStatus,
        updated_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let Some((task_id, topic_id)) = tasks
            .values()
            .find(|task| is_live(task) && task.external_task_id() == Some(external_task_id))
            .map(|task| (task.id(), task.topic_id()))
        else {
            return Ok(false);
        };
        if status == TaskStatus::Running {
            ensure_topic_idle(&tasks, topic_id, task_id)?;
        }
        let task = tasks
            .get_mut(&task_id)
            .ok_or(TaskRepositoryError::NotFound(task_id))?;
        task.apply_status_at(status, updated_at)
            .map_err(|err| match err {
                TaskDomainError::InvalidStatusTransition {
                    task_id: refused,
                    from,
                    to,
                } => TaskRepositoryError::InvalidTransition {
                    task_id: refused,
                    from,
                    to,
                },
                other => TaskRepositoryError::persistence(other),
            })?;
        Ok(true)
    }

    async fn mark_stale_running_as_error(
        &self,
        threshold: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<u64> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let mut reclaimed = 0;
        for task in tasks.values_mut().filter(|task| {
            is_live(task) && task.is_running() && task.updated_at() < threshold
        }) {
            if task
                .apply_status_at(TaskStatus::Error, updated_at)
                .map_err(TaskRepositoryError::persistence)?
            {
                reclaimed += 1;
            }
        }
        Ok(reclaimed)
    }

    async fn soft_delete(
        &self,
        id: TaskId,
        deleted_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        match tasks.get_mut(&id).filter(|task| is_live(task)) {
            Some(task) => {
                task.mark_deleted(deleted_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete_by_topic(
        &self,
        topic_id: TopicId,
        deleted_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<u64> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let mut deleted = 0;
        for task in tasks
            .values_mut()
            .filter(|task| is_live(task) && task.topic_id() == topic_id)
        {
            task.mark_deleted(deleted_at);
            deleted += 1;
        }
        Ok(deleted)
    }
}
