//! Task lifecycle orchestration.
//!
//! The service owns every status change a task goes through: creation from
//! an inbound instruction, reports from the sandbox, interrupts and the
//! stale-task sweep. Files and transcript entries are recorded here too.

use super::{
    AiMessageRequest, InitTopicTaskRequest, RegisterTaskFileRequest, UpdateTaskStatusRequest,
};
use crate::isolation::DataIsolation;
use crate::sandbox::domain::SandboxId;
use crate::sandbox::services::{InterruptDispatcher, InterruptError};
use crate::task::{
    domain::{
        ExternalTaskId, FileKey, MessageRole, MessageType, Task, TaskDomainError, TaskFile,
        TaskFileOwner, TaskId, TaskInstruction, TaskMessage, TaskStatus,
    },
    ports::{
        TaskFileRepository, TaskFileRepositoryError, TaskMessageRepository,
        TaskMessageRepositoryError, TaskRepository, TaskRepositoryError,
    },
};
use crate::topic::{
    domain::{ChatTopicId, Topic, TopicId},
    ports::{TopicRepository, TopicRepositoryError},
};
use crate::workspace::{
    domain::{WorkspaceDomainError, WorkspaceId},
    ports::{WorkspaceRepository, WorkspaceRepositoryError},
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for task orchestration.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The owning workspace refused new work.
    #[error(transparent)]
    Workspace(#[from] WorkspaceDomainError),

    /// Task repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// Task file repository operation failed.
    #[error(transparent)]
    FileRepository(#[from] TaskFileRepositoryError),

    /// Transcript repository operation failed.
    #[error(transparent)]
    MessageRepository(#[from] TaskMessageRepositoryError),

    /// Topic repository operation failed.
    #[error(transparent)]
    TopicRepository(#[from] TopicRepositoryError),

    /// Workspace repository operation failed.
    #[error(transparent)]
    WorkspaceRepository(#[from] WorkspaceRepositoryError),

    /// No topic owned by the caller is bound to the chat topic.
    #[error("no topic is bound to chat topic {0}")]
    ChatTopicNotFound(ChatTopicId),

    /// The topic is absent or not owned by the caller.
    #[error("topic not found: {0}")]
    TopicNotFound(TopicId),

    /// The task is absent, not owned by the caller or on another topic.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The workspace owning the topic is absent.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(WorkspaceId),

    /// A follow-up or interrupt arrived while no task was running.
    #[error("no active task on topic {0}")]
    NoRunningTask(TopicId),

    /// Another task on the topic is already running.
    #[error("topic {topic_id} already runs task {running_task_id}")]
    TopicBusy {
        /// Topic with the running task.
        topic_id: TopicId,
        /// Task already running.
        running_task_id: TaskId,
    },

    /// Running tasks cannot be deleted.
    #[error("task {0} is running and cannot be deleted")]
    TaskRunning(TaskId),

    /// The sandbox did not acknowledge an interrupt; its state is unknown.
    #[error("sandbox {sandbox_id} did not acknowledge interrupt within {waited:?}")]
    InterruptTimeout {
        /// Sandbox that stayed silent.
        sandbox_id: SandboxId,
        /// How long the handshake waited.
        waited: Duration,
    },

    /// The interrupt handshake failed before a reply could be awaited.
    #[error("interrupt failed: {0}")]
    Interrupt(InterruptError),

    /// A concurrent registration won the insert but its row vanished before
    /// it could be read back.
    #[error("file {0} was registered concurrently and then removed")]
    FileRegistrationLost(FileKey),

    /// The stale window cannot be represented as a timestamp offset.
    #[error("stale window {0:?} is out of range")]
    StaleWindowOutOfRange(Duration),
}

impl TaskServiceError {
    /// Returns `true` for errors meaning the target does not exist or is not
    /// visible to the caller.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ChatTopicNotFound(_)
                | Self::TopicNotFound(_)
                | Self::TaskNotFound(_)
                | Self::WorkspaceNotFound(_)
                | Self::NoRunningTask(_)
        )
    }
}

impl From<InterruptError> for TaskServiceError {
    fn from(err: InterruptError) -> Self {
        match err {
            InterruptError::Timeout { sandbox_id, waited } => {
                Self::InterruptTimeout { sandbox_id, waited }
            }
            other => Self::Interrupt(other),
        }
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task orchestration service.
#[derive(Clone)]
pub struct TaskDomainService<C>
where
    C: Clock + Send + Sync,
{
    tasks: Arc<dyn TaskRepository>,
    files: Arc<dyn TaskFileRepository>,
    messages: Arc<dyn TaskMessageRepository>,
    topics: Arc<dyn TopicRepository>,
    workspaces: Arc<dyn WorkspaceRepository>,
    interrupts: InterruptDispatcher,
    clock: Arc<C>,
}

impl<C> TaskDomainService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a new task orchestration service.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        files: Arc<dyn TaskFileRepository>,
        messages: Arc<dyn TaskMessageRepository>,
        topics: Arc<dyn TopicRepository>,
        workspaces: Arc<dyn WorkspaceRepository>,
        interrupts: InterruptDispatcher,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tasks,
            files,
            messages,
            topics,
            workspaces,
            interrupts,
            clock,
        }
    }

    /// Resolves an inbound instruction against the caller's chat topic.
    ///
    /// `FollowUp` and `Interrupted` attach to the topic's running task and
    /// never create one. `Normal` creates a waiting task that inherits the
    /// topic's sandbox and work directory, then points the topic at it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::ChatTopicNotFound`] when the chat topic is
    /// unknown, [`TaskServiceError::NoRunningTask`] when attaching without a
    /// running task, and [`TaskServiceError::Workspace`] when the workspace
    /// is archived.
    pub async fn init_topic_task(
        &self,
        isolation: &DataIsolation,
        request: InitTopicTaskRequest,
    ) -> TaskServiceResult<Task> {
        let mut topic = self
            .topics
            .find_by_chat_topic_id(isolation.user_id(), &request.chat_topic_id)
            .await?
            .filter(|topic| topic.is_owned_by(isolation))
            .ok_or_else(|| TaskServiceError::ChatTopicNotFound(request.chat_topic_id.clone()))?;

        match request.instruction {
            TaskInstruction::FollowUp | TaskInstruction::Interrupted => {
                let running = self
                    .tasks
                    .find_running_by_topic(topic.id())
                    .await?
                    .ok_or(TaskServiceError::NoRunningTask(topic.id()))?;
                debug!(
                    topic_id = %topic.id(),
                    task_id = %running.id(),
                    instruction = %request.instruction,
                    "attached to running task"
                );
                Ok(running)
            }
            TaskInstruction::Normal => {
                let workspace = self
                    .workspaces
                    .find_by_id(topic.workspace_id())
                    .await?
                    .ok_or(TaskServiceError::WorkspaceNotFound(topic.workspace_id()))?;
                workspace.ensure_accepts_new_work()?;

                let task_mode = request.task_mode.unwrap_or_else(|| topic.task_mode());
                let task = Task::for_topic(
                    isolation,
                    &topic,
                    task_mode,
                    request.prompt,
                    request.attachments,
                    &*self.clock,
                );
                self.tasks.store(&task).await?;

                // The topic pointer is a cache; the task row stays
                // authoritative if this second write is lost.
                topic.point_at_task(task.id(), task.status(), task_mode, &*self.clock);
                self.topics.update(&topic).await?;

                info!(
                    topic_id = %topic.id(),
                    task_id = %task.id(),
                    task_mode = %task_mode,
                    sandbox_id = task.sandbox_id().map_or("", |id| id.as_str()),
                    "created task"
                );
                Ok(task)
            }
        }
    }

    /// Applies a sandbox status report and mirrors it onto the topic.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TopicNotFound`] or
    /// [`TaskServiceError::TaskNotFound`] when either record is missing,
    /// [`TaskServiceError::TopicBusy`] when another task on the topic is
    /// already running, and [`TaskServiceError::Domain`] when the state
    /// machine refuses the change.
    pub async fn update_task_status(
        &self,
        isolation: &DataIsolation,
        request: UpdateTaskStatusRequest,
    ) -> TaskServiceResult<Task> {
        let mut topic = self.owned_topic(isolation, request.topic_id).await?;
        let mut task = self.owned_task(isolation, request.task_id).await?;
        if task.topic_id() != topic.id() {
            return Err(TaskServiceError::TaskNotFound(task.id()));
        }

        if request.status == TaskStatus::Running && !task.is_running() {
            let running = self.tasks.find_running_by_topic(topic.id()).await?;
            if let Some(other) = running.filter(|candidate| candidate.id() != task.id()) {
                return Err(TaskServiceError::TopicBusy {
                    topic_id: topic.id(),
                    running_task_id: other.id(),
                });
            }
        }

        if let Some(sandbox_id) = request.sandbox_id.clone() {
            task.bind_sandbox(sandbox_id, &*self.clock);
        }
        if let Some(external_task_id) = request.external_task_id {
            task.bind_external_id(external_task_id, &*self.clock);
        }
        let changed = task.apply_status(request.status, &*self.clock)?;
        self.tasks.update(&task).await.map_err(busy_or_repository)?;

        topic.mirror_task_status(task.id(), request.sandbox_id, request.status, &*self.clock);
        self.topics.update(&topic).await?;

        debug!(
            topic_id = %topic.id(),
            task_id = %task.id(),
            status = %request.status,
            changed,
            "applied task status report"
        );
        Ok(task)
    }

    /// Applies a status ping addressed by the sandbox's task identifier.
    ///
    /// Only the task row is written; the topic mirror is skipped on this hot
    /// path. A ping repeating the current status refreshes the task's
    /// heartbeat so the stale sweep leaves it alone. Returns `false` when no
    /// live task matched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TopicBusy`] when another task on the topic
    /// is running, and [`TaskServiceError::Repository`] when the write fails
    /// or the state machine refuses the change.
    pub async fn update_task_status_by_external_id(
        &self,
        external_task_id: &ExternalTaskId,
        status: TaskStatus,
    ) -> TaskServiceResult<bool> {
        let updated = self
            .tasks
            .update_status_by_external_id(external_task_id, status, self.clock.utc())
            .await
            .map_err(busy_or_repository)?;
        debug!(
            external_task_id = %external_task_id,
            status = %status,
            updated,
            "applied task status ping"
        );
        Ok(updated)
    }

    /// Interrupts the sandbox running `task`.
    ///
    /// Returns `false` when the task has no bound sandbox and `true` when the
    /// sandbox acknowledged or is already gone.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::InterruptTimeout`] when the sandbox does
    /// not answer, and [`TaskServiceError::Interrupt`] when it cannot be
    /// reached.
    pub async fn handle_interrupt_instruction(&self, task: &Task) -> TaskServiceResult<bool> {
        let outcome = self
            .interrupts
            .interrupt(task.sandbox_id(), task.user_id(), &task.id().to_string())
            .await
            .inspect_err(|err| {
                warn!(task_id = %task.id(), error = %err, "interrupt handshake failed");
            })?;
        Ok(outcome.is_satisfied())
    }

    /// Moves every running task last updated before `threshold` to error.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when the bulk write fails.
    pub async fn update_stale_running_tasks(
        &self,
        threshold: DateTime<Utc>,
    ) -> TaskServiceResult<u64> {
        let reclaimed = self
            .tasks
            .mark_stale_running_as_error(threshold, self.clock.utc())
            .await?;
        if reclaimed > 0 {
            info!(count = reclaimed, %threshold, "reclaimed stale running tasks");
        } else {
            debug!(%threshold, "no stale running tasks");
        }
        Ok(reclaimed)
    }

    /// Reclaims running tasks idle for longer than `max_idle`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::StaleWindowOutOfRange`] for windows that do
    /// not fit a timestamp offset, and repository errors from the sweep.
    pub async fn sweep_stale_running_tasks(&self, max_idle: Duration) -> TaskServiceResult<u64> {
        let window = TimeDelta::from_std(max_idle)
            .map_err(|_| TaskServiceError::StaleWindowOutOfRange(max_idle))?;
        let threshold = self
            .clock
            .utc()
            .checked_sub_signed(window)
            .ok_or(TaskServiceError::StaleWindowOutOfRange(max_idle))?;
        self.update_stale_running_tasks(threshold).await
    }

    /// Registers a file by its key, returning the first writer's record.
    ///
    /// A concurrent producer that wins the insert race is read back rather
    /// than reported as an error.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] for invalid metadata and
    /// repository errors from the lookup or insert.
    pub async fn save_or_create_task_file_by_file_key(
        &self,
        isolation: &DataIsolation,
        request: RegisterTaskFileRequest,
    ) -> TaskServiceResult<TaskFile> {
        if let Some(existing) = self.files.find_by_file_key(&request.file_key).await? {
            return Ok(existing);
        }

        let file_key = request.file_key.clone();
        let sandbox_id = request.sandbox_id.clone();
        let file = TaskFile::new(
            request.file_key,
            isolation,
            TaskFileOwner {
                topic_id: request.topic_id,
                task_id: request.task_id,
            },
            request.file_type,
            request.data,
            &*self.clock,
        )?;

        if self.files.insert_or_ignore(&file).await? {
            debug!(
                file_key = %file_key,
                task_id = %file.task_id(),
                sandbox_id = sandbox_id.as_ref().map_or("", SandboxId::as_str),
                "registered task file"
            );
            return Ok(file);
        }

        debug!(file_key = %file_key, "task file registered concurrently, reading winner");
        self.files
            .find_by_file_key(&file_key)
            .await?
            .ok_or(TaskServiceError::FileRegistrationLost(file_key))
    }

    /// Appends a transcript entry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::MessageRepository`] when the append fails.
    pub async fn record_task_message(
        &self,
        message: TaskMessage,
    ) -> TaskServiceResult<TaskMessage> {
        self.messages.append(&message).await?;
        Ok(message)
    }

    /// Appends the user's prompt to the transcript.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::MessageRepository`] when the append fails.
    pub async fn record_user_message(
        &self,
        task: &Task,
        content: impl Into<String> + Send,
        attachments: Option<Value>,
    ) -> TaskServiceResult<TaskMessage> {
        let mut message =
            TaskMessage::new(task, MessageRole::User, MessageType::Chat, content, &*self.clock);
        if let Some(value) = attachments {
            message = message.with_attachments(value);
        }
        self.record_task_message(message).await
    }

    /// Appends agent output to the transcript.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::MessageRepository`] when the append fails.
    pub async fn record_ai_message(
        &self,
        task: &Task,
        request: AiMessageRequest,
    ) -> TaskServiceResult<TaskMessage> {
        let AiMessageRequest {
            message_type,
            content,
            status,
            steps,
            tool,
            attachments,
            event,
        } = request;
        let mut message =
            TaskMessage::new(task, MessageRole::Assistant, message_type, content, &*self.clock);
        if let Some(value) = status {
            message = message.with_status(value);
        }
        if let Some(value) = steps {
            message = message.with_steps(value);
        }
        if let Some(value) = tool {
            message = message.with_tool(value);
        }
        if let Some(value) = attachments {
            message = message.with_attachments(value);
        }
        if let Some(value) = event {
            message = message.with_event(value);
        }
        self.record_task_message(message).await
    }

    /// Returns a task owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task is missing or
    /// owned by someone else.
    pub async fn get_task(
        &self,
        isolation: &DataIsolation,
        task_id: TaskId,
    ) -> TaskServiceResult<Task> {
        self.owned_task(isolation, task_id).await
    }

    /// Lists the live tasks on a topic owned by the caller, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TopicNotFound`] when the topic is missing
    /// or owned by someone else.
    pub async fn list_topic_tasks(
        &self,
        isolation: &DataIsolation,
        topic_id: TopicId,
    ) -> TaskServiceResult<Vec<Task>> {
        let topic = self.owned_topic(isolation, topic_id).await?;
        Ok(self.tasks.list_by_topic(topic.id()).await?)
    }

    /// Returns the running task on a topic owned by the caller, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TopicNotFound`] when the topic is missing
    /// or owned by someone else.
    pub async fn find_running_task(
        &self,
        isolation: &DataIsolation,
        topic_id: TopicId,
    ) -> TaskServiceResult<Option<Task>> {
        let topic = self.owned_topic(isolation, topic_id).await?;
        Ok(self.tasks.find_running_by_topic(topic.id()).await?)
    }

    /// Soft-deletes a task that is not running.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskRunning`] while the task runs and
    /// [`TaskServiceError::TaskNotFound`] when it is missing.
    pub async fn delete_task(
        &self,
        isolation: &DataIsolation,
        task_id: TaskId,
    ) -> TaskServiceResult<()> {
        let task = self.owned_task(isolation, task_id).await?;
        if task.is_running() {
            return Err(TaskServiceError::TaskRunning(task.id()));
        }
        if !self.tasks.soft_delete(task.id(), self.clock.utc()).await? {
            return Err(TaskServiceError::TaskNotFound(task.id()));
        }
        info!(task_id = %task.id(), topic_id = %task.topic_id(), "deleted task");
        Ok(())
    }

    /// Lists the files registered by a task owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task is missing.
    pub async fn list_task_files(
        &self,
        isolation: &DataIsolation,
        task_id: TaskId,
    ) -> TaskServiceResult<Vec<TaskFile>> {
        let task = self.owned_task(isolation, task_id).await?;
        Ok(self.files.list_by_task(task.id()).await?)
    }

    /// Lists a task's transcript in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task is missing.
    pub async fn list_task_messages(
        &self,
        isolation: &DataIsolation,
        task_id: TaskId,
    ) -> TaskServiceResult<Vec<TaskMessage>> {
        let task = self.owned_task(isolation, task_id).await?;
        Ok(self.messages.list_by_task(task.id()).await?)
    }

    /// Soft-deletes every live task on a topic, returning the count.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when the bulk write fails.
    pub async fn soft_delete_topic_tasks(&self, topic_id: TopicId) -> TaskServiceResult<u64> {
        let deleted = self
            .tasks
            .soft_delete_by_topic(topic_id, self.clock.utc())
            .await?;
        debug!(topic_id = %topic_id, count = deleted, "soft-deleted topic tasks");
        Ok(deleted)
    }

    async fn owned_topic(
        &self,
        isolation: &DataIsolation,
        topic_id: TopicId,
    ) -> TaskServiceResult<Topic> {
        self.topics
            .find_by_id(topic_id)
            .await?
            .filter(|topic| topic.is_owned_by(isolation))
            .ok_or(TaskServiceError::TopicNotFound(topic_id))
    }

    async fn owned_task(
        &self,
        isolation: &DataIsolation,
        task_id: TaskId,
    ) -> TaskServiceResult<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .filter(|task| task.is_owned_by(isolation))
            .ok_or(TaskServiceError::TaskNotFound(task_id))
    }
}

/// Lifts the repository's running-sibling refusal to the service error.
fn busy_or_repository(err: TaskRepositoryError) -> TaskServiceError {
    match err {
        TaskRepositoryError::TopicBusy {
            topic_id,
            running_task_id,
        } => TaskServiceError::TopicBusy {
            topic_id,
            running_task_id,
        },
        other => TaskServiceError::Repository(other),
    }
}
