//! Task aggregate root.

use super::{ExternalTaskId, TaskDomainError, TaskId, TaskMode, TaskStatus};
use crate::isolation::{DataIsolation, OrganizationCode, UserId};
use crate::sandbox::domain::SandboxId;
use crate::topic::domain::{Topic, TopicId};
use crate::workspace::domain::WorkspaceId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Task aggregate root: one unit of work dispatched to a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    external_task_id: Option<ExternalTaskId>,
    user_id: UserId,
    organization_code: OrganizationCode,
    workspace_id: WorkspaceId,
    topic_id: TopicId,
    sandbox_id: Option<SandboxId>,
    task_mode: TaskMode,
    prompt: String,
    attachments: Option<Value>,
    status: TaskStatus,
    work_dir: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Identifier assigned by the sandbox, if any.
    pub external_task_id: Option<ExternalTaskId>,
    /// Owning user.
    pub user_id: UserId,
    /// Owning organization.
    pub organization_code: OrganizationCode,
    /// Workspace containing the topic.
    pub workspace_id: WorkspaceId,
    /// Owning topic.
    pub topic_id: TopicId,
    /// Sandbox executing the task, if bound.
    pub sandbox_id: Option<SandboxId>,
    /// Execution mode.
    pub task_mode: TaskMode,
    /// Prompt submitted by the user.
    pub prompt: String,
    /// Serialized attachments submitted with the prompt.
    pub attachments: Option<Value>,
    /// Execution status.
    pub status: TaskStatus,
    /// Working directory inside the sandbox.
    pub work_dir: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion timestamp, if deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a waiting task on `topic`.
    ///
    /// The task inherits the topic's sandbox and work directory so follow-up
    /// work lands in the same sandbox.
    #[must_use]
    pub fn for_topic(
        isolation: &DataIsolation,
        topic: &Topic,
        task_mode: TaskMode,
        prompt: impl Into<String>,
        attachments: Option<Value>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            external_task_id: None,
            user_id: isolation.user_id().clone(),
            organization_code: isolation.organization_code().clone(),
            workspace_id: topic.workspace_id(),
            topic_id: topic.id(),
            sandbox_id: topic.sandbox_id().cloned(),
            task_mode,
            prompt: prompt.into(),
            attachments,
            status: TaskStatus::Waiting,
            work_dir: topic.work_dir().to_owned(),
            created_at: timestamp,
            updated_at: timestamp,
            deleted_at: None,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            external_task_id: data.external_task_id,
            user_id: data.user_id,
            organization_code: data.organization_code,
            workspace_id: data.workspace_id,
            topic_id: data.topic_id,
            sandbox_id: data.sandbox_id,
            task_mode: data.task_mode,
            prompt: data.prompt,
            attachments: data.attachments,
            status: data.status,
            work_dir: data.work_dir,
            created_at: data.created_at,
            updated_at: data.updated_at,
            deleted_at: data.deleted_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the identifier assigned by the sandbox, if any.
    #[must_use]
    pub const fn external_task_id(&self) -> Option<&ExternalTaskId> {
        self.external_task_id.as_ref()
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the owning organization.
    #[must_use]
    pub const fn organization_code(&self) -> &OrganizationCode {
        &self.organization_code
    }

    /// Returns the workspace containing the topic.
    #[must_use]
    pub const fn workspace_id(&self) -> WorkspaceId {
        self.workspace_id
    }

    /// Returns the owning topic.
    #[must_use]
    pub const fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    /// Returns the bound sandbox, if any.
    #[must_use]
    pub const fn sandbox_id(&self) -> Option<&SandboxId> {
        self.sandbox_id.as_ref()
    }

    /// Returns the execution mode.
    #[must_use]
    pub const fn task_mode(&self) -> TaskMode {
        self.task_mode
    }

    /// Returns the prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the serialized attachments.
    #[must_use]
    pub const fn attachments(&self) -> Option<&Value> {
        self.attachments.as_ref()
    }

    /// Returns the execution status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the working directory inside the sandbox.
    #[must_use]
    pub fn work_dir(&self) -> &str {
        &self.work_dir
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the soft-deletion timestamp, if deleted.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns `true` while the task is executing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }

    /// Returns `true` when the caller owns this task.
    #[must_use]
    pub fn is_owned_by(&self, isolation: &DataIsolation) -> bool {
        isolation.owns(&self.user_id, &self.organization_code)
    }

    /// Applies a status change.
    ///
    /// Reporting the current status again changes nothing but the
    /// heartbeat: `updated_at` moves forward and `Ok(false)` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] when the state
    /// machine does not permit the change.
    pub fn apply_status(
        &mut self,
        status: TaskStatus,
        clock: &impl Clock,
    ) -> Result<bool, TaskDomainError> {
        self.apply_status_at(status, clock.utc())
    }

    /// Applies a status change stamped with an explicit timestamp.
    ///
    /// Used by repositories that apply status changes inside a single write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] when the state
    /// machine does not permit the change.
    pub fn apply_status_at(
        &mut self,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, TaskDomainError> {
        if self.status == status {
            self.updated_at = at;
            return Ok(false);
        }
        if !self.status.can_transition_to(status) {
            return Err(TaskDomainError::InvalidStatusTransition {
                task_id: self.id,
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.updated_at = at;
        Ok(true)
    }

    /// Binds the sandbox executing this task.
    pub fn bind_sandbox(&mut self, sandbox_id: SandboxId, clock: &impl Clock) {
        if self.sandbox_id.as_ref() != Some(&sandbox_id) {
            self.sandbox_id = Some(sandbox_id);
            self.touch(clock);
        }
    }

    /// Records the identifier the sandbox assigned to this task.
    pub fn bind_external_id(&mut self, external_task_id: ExternalTaskId, clock: &impl Clock) {
        if self.external_task_id.as_ref() != Some(&external_task_id) {
            self.external_task_id = Some(external_task_id);
            self.touch(clock);
        }
    }

    /// Marks the task as soft-deleted at `deleted_at`.
    pub fn mark_deleted(&mut self, deleted_at: DateTime<Utc>) {
        self.deleted_at = Some(deleted_at);
        self.updated_at = deleted_at;
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
