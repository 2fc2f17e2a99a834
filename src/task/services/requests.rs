//! Request payloads accepted by the task domain service.

use crate::sandbox::domain::SandboxId;
use crate::task::domain::{
    ExternalTaskId, FileKey, MessageType, TaskFileData, TaskFileType, TaskId, TaskInstruction,
    TaskMode, TaskStatus,
};
use crate::topic::domain::{ChatTopicId, TopicId};
use serde_json::Value;

/// Inbound task event resolved against a chat topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitTopicTaskRequest {
    pub(crate) chat_topic_id: ChatTopicId,
    pub(crate) instruction: TaskInstruction,
    pub(crate) task_mode: Option<TaskMode>,
    pub(crate) prompt: String,
    pub(crate) attachments: Option<Value>,
}

impl InitTopicTaskRequest {
    /// Creates a request that starts a new task with `prompt`.
    #[must_use]
    pub fn new(chat_topic_id: ChatTopicId, prompt: impl Into<String>) -> Self {
        Self {
            chat_topic_id,
            instruction: TaskInstruction::Normal,
            task_mode: None,
            prompt: prompt.into(),
            attachments: None,
        }
    }

    /// Sets the caller's instruction.
    #[must_use]
    pub const fn with_instruction(mut self, instruction: TaskInstruction) -> Self {
        self.instruction = instruction;
        self
    }

    /// Sets the task mode. Without one the topic's remembered mode is used.
    #[must_use]
    pub const fn with_task_mode(mut self, task_mode: TaskMode) -> Self {
        self.task_mode = Some(task_mode);
        self
    }

    /// Sets the serialized attachments.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Value) -> Self {
        self.attachments = Some(attachments);
        self
    }
}

/// Status report from a sandbox for a known task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskStatusRequest {
    pub(crate) topic_id: TopicId,
    pub(crate) task_id: TaskId,
    pub(crate) status: TaskStatus,
    pub(crate) sandbox_id: Option<SandboxId>,
    pub(crate) external_task_id: Option<ExternalTaskId>,
}

impl UpdateTaskStatusRequest {
    /// Creates a status report for `task_id` on `topic_id`.
    #[must_use]
    pub const fn new(topic_id: TopicId, task_id: TaskId, status: TaskStatus) -> Self {
        Self {
            topic_id,
            task_id,
            status,
            sandbox_id: None,
            external_task_id: None,
        }
    }

    /// Sets the sandbox executing the task.
    #[must_use]
    pub fn with_sandbox_id(mut self, sandbox_id: SandboxId) -> Self {
        self.sandbox_id = Some(sandbox_id);
        self
    }

    /// Sets the identifier the sandbox assigned to the task.
    #[must_use]
    pub fn with_external_task_id(mut self, external_task_id: ExternalTaskId) -> Self {
        self.external_task_id = Some(external_task_id);
        self
    }
}

/// File registration reported by a producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterTaskFileRequest {
    pub(crate) file_key: FileKey,
    pub(crate) topic_id: TopicId,
    pub(crate) task_id: TaskId,
    pub(crate) sandbox_id: Option<SandboxId>,
    pub(crate) file_type: TaskFileType,
    pub(crate) data: TaskFileData,
}

impl RegisterTaskFileRequest {
    /// Creates a registration for `file_key` produced by `task_id`.
    #[must_use]
    pub fn new(file_key: FileKey, topic_id: TopicId, task_id: TaskId, data: TaskFileData) -> Self {
        Self {
            file_key,
            topic_id,
            task_id,
            sandbox_id: None,
            file_type: TaskFileType::default(),
            data,
        }
    }

    /// Sets the sandbox that produced the file.
    #[must_use]
    pub fn with_sandbox_id(mut self, sandbox_id: SandboxId) -> Self {
        self.sandbox_id = Some(sandbox_id);
        self
    }

    /// Sets the file role.
    #[must_use]
    pub const fn with_file_type(mut self, file_type: TaskFileType) -> Self {
        self.file_type = file_type;
        self
    }
}

/// Agent output to append to a task transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiMessageRequest {
    pub(crate) message_type: MessageType,
    pub(crate) content: String,
    pub(crate) status: Option<TaskStatus>,
    pub(crate) steps: Option<Value>,
    pub(crate) tool: Option<Value>,
    pub(crate) attachments: Option<Value>,
    pub(crate) event: Option<String>,
}

impl AiMessageRequest {
    /// Creates an agent message of `message_type`.
    #[must_use]
    pub fn new(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            message_type,
            content: content.into(),
            status: None,
            steps: None,
            tool: None,
            attachments: None,
            event: None,
        }
    }

    /// Sets the task status reported with the message.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the plan steps.
    #[must_use]
    pub fn with_steps(mut self, steps: Value) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Sets the tool details.
    #[must_use]
    pub fn with_tool(mut self, tool: Value) -> Self {
        self.tool = Some(tool);
        self
    }

    /// Sets the attachments.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Value) -> Self {
        self.attachments = Some(attachments);
        self
    }

    /// Sets the sandbox event name.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }
}
