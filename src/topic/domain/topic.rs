//! Topic aggregate root.

use super::{ChatBinding, TopicId, TopicName};
use crate::isolation::{DataIsolation, OrganizationCode, UserId};
use crate::sandbox::domain::SandboxId;
use crate::task::domain::{TaskId, TaskMode, TaskStatus};
use crate::workspace::domain::WorkspaceId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Topic aggregate root.
///
/// `current_task_id` and `current_task_status` are a denormalized cache of
/// the latest task; the task table stays authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    id: TopicId,
    workspace_id: WorkspaceId,
    user_id: UserId,
    organization_code: OrganizationCode,
    chat: ChatBinding,
    name: TopicName,
    sandbox_id: Option<SandboxId>,
    work_dir: String,
    current_task_id: Option<TaskId>,
    current_task_status: Option<TaskStatus>,
    task_mode: TaskMode,
    sandbox_config: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTopicData {
    /// Persisted topic identifier.
    pub id: TopicId,
    /// Owning workspace.
    pub workspace_id: WorkspaceId,
    /// Owning user.
    pub user_id: UserId,
    /// Owning organization.
    pub organization_code: OrganizationCode,
    /// Chat-layer correlation keys.
    pub chat: ChatBinding,
    /// Display name.
    pub name: TopicName,
    /// Most recently used sandbox, if any.
    pub sandbox_id: Option<SandboxId>,
    /// Working directory inherited by new tasks.
    pub work_dir: String,
    /// Weak pointer to the latest task.
    pub current_task_id: Option<TaskId>,
    /// Cached status of the latest task.
    pub current_task_status: Option<TaskStatus>,
    /// Task mode remembered for the next task.
    pub task_mode: TaskMode,
    /// Opaque sandbox configuration.
    pub sandbox_config: Option<Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion timestamp, if deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Topic {
    /// Creates a new topic in `workspace_id` for the caller.
    ///
    /// The work directory defaults to a path derived from the workspace and
    /// topic identifiers.
    #[must_use]
    pub fn new(
        isolation: &DataIsolation,
        workspace_id: WorkspaceId,
        chat: ChatBinding,
        name: TopicName,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        let id = TopicId::new();
        Self {
            id,
            workspace_id,
            user_id: isolation.user_id().clone(),
            organization_code: isolation.organization_code().clone(),
            chat,
            name,
            sandbox_id: None,
            work_dir: format!("workspace_{workspace_id}/topic_{id}"),
            current_task_id: None,
            current_task_status: None,
            task_mode: TaskMode::default(),
            sandbox_config: None,
            created_at: timestamp,
            updated_at: timestamp,
            deleted_at: None,
        }
    }

    /// Reconstructs a topic from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTopicData) -> Self {
        Self {
            id: data.id,
            workspace_id: data.workspace_id,
            user_id: data.user_id,
            organization_code: data.organization_code,
            chat: data.chat,
            name: data.name,
            sandbox_id: data.sandbox_id,
            work_dir: data.work_dir,
            current_task_id: data.current_task_id,
            current_task_status: data.current_task_status,
            task_mode: data.task_mode,
            sandbox_config: data.sandbox_config,
            created_at: data.created_at,
            updated_at: data.updated_at,
            deleted_at: data.deleted_at,
        }
    }

    /// Returns the topic identifier.
    #[must_use]
    pub const fn id(&self) -> TopicId {
        self.id
    }

    /// Returns the owning workspace.
    #[must_use]
    pub const fn workspace_id(&self) -> WorkspaceId {
        self.workspace_id
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

    /// Returns the chat-layer correlation keys.
    #[must_use]
    pub const fn chat(&self) -> &ChatBinding {
        &self.chat
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &TopicName {
        &self.name
    }

    /// Returns the most recently used sandbox, if any.
    #[must_use]
    pub const fn sandbox_id(&self) -> Option<&SandboxId> {
        self.sandbox_id.as_ref()
    }

    /// Returns the working directory inherited by new tasks.
    #[must_use]
    pub fn work_dir(&self) -> &str {
        &self.work_dir
    }

    /// Returns the weak pointer to the latest task.
    #[must_use]
    pub const fn current_task_id(&self) -> Option<TaskId> {
        self.current_task_id
    }

    /// Returns the cached status of the latest task.
    #[must_use]
    pub const fn current_task_status(&self) -> Option<TaskStatus> {
        self.current_task_status
    }

    /// Returns the task mode remembered for the next task.
    #[must_use]
    pub const fn task_mode(&self) -> TaskMode {
        self.task_mode
    }

    /// Returns the opaque sandbox configuration.
    #[must_use]
    pub const fn sandbox_config(&self) -> Option<&Value> {
        self.sandbox_config.as_ref()
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

    /// Returns `true` when the caller owns this topic.
    #[must_use]
    pub fn is_owned_by(&self, isolation: &DataIsolation) -> bool {
        isolation.owns(&self.user_id, &self.organization_code)
    }

    /// Returns `true` when the cached task status says work is running.
    #[must_use]
    pub fn has_running_task(&self) -> bool {
        self.current_task_status == Some(TaskStatus::Running)
    }

    /// Renames the topic.
    pub fn rename(&mut self, name: TopicName, clock: &impl Clock) {
        self.name = name;
        self.touch(clock);
    }

    /// Replaces the working directory inherited by future tasks.
    pub fn set_work_dir(&mut self, work_dir: impl Into<String>, clock: &impl Clock) {
        self.work_dir = work_dir.into();
        self.touch(clock);
    }

    /// Replaces the opaque sandbox configuration.
    pub fn set_sandbox_config(&mut self, sandbox_config: Option<Value>, clock: &impl Clock) {
        self.sandbox_config = sandbox_config;
        self.touch(clock);
    }

    /// Sets the task mode used when a request does not name one.
    pub fn set_task_mode(&mut self, task_mode: TaskMode, clock: &impl Clock) {
        self.task_mode = task_mode;
        self.touch(clock);
    }

    /// Points the topic at a newly created task.
    pub fn point_at_task(
        &mut self,
        task_id: TaskId,
        status: TaskStatus,
        task_mode: TaskMode,
        clock: &impl Clock,
    ) {
        self.current_task_id = Some(task_id);
        self.current_task_status = Some(status);
        self.task_mode = task_mode;
        self.touch(clock);
    }

    /// Mirrors a task status report onto the topic.
    ///
    /// A reported sandbox becomes the topic's sticky sandbox; an absent one
    /// leaves the previous binding in place. The cached status only follows
    /// the task the topic currently points at, so late reports from older
    /// tasks cannot overwrite it.
    pub fn mirror_task_status(
        &mut self,
        task_id: TaskId,
        sandbox_id: Option<SandboxId>,
        status: TaskStatus,
        clock: &impl Clock,
    ) {
        if sandbox_id.is_some() {
            self.sandbox_id = sandbox_id;
        }
        match self.current_task_id {
            Some(current) if current != task_id => {}
            _ => {
                self.current_task_id = Some(task_id);
                self.current_task_status = Some(status);
            }
        }
        self.touch(clock);
    }

    /// Marks the topic as soft-deleted at `deleted_at`.
    pub fn mark_deleted(&mut self, deleted_at: DateTime<Utc>) {
        self.deleted_at = Some(deleted_at);
        self.updated_at = deleted_at;
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
