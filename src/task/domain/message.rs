//! Append-only transcript entries recorded for a task.

use super::{ParseTaskAttributeError, Task, TaskId, TaskMessageId, TaskStatus};
use crate::topic::domain::TopicId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Who sent a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// The human user.
    User,
    /// The agent running in the sandbox.
    Assistant,
}

impl MessageRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Returns the role on the other end of the conversation.
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::User => Self::Assistant,
            Self::Assistant => Self::User,
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MessageRole {
    type Error = ParseTaskAttributeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(ParseTaskAttributeError::new("message role", value)),
        }
    }
}

/// Kind of transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Conversational text.
    #[default]
    Chat,
    /// Task progress report.
    TaskUpdate,
    /// Tool invocation or result.
    Tool,
}

impl MessageType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::TaskUpdate => "task_update",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MessageType {
    type Error = ParseTaskAttributeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "task_update" => Ok(Self::TaskUpdate),
            "tool" => Ok(Self::Tool),
            _ => Err(ParseTaskAttributeError::new("message type", value)),
        }
    }
}

/// Immutable transcript entry.
///
/// Entries are built with the `with_*` methods and never change once
/// appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMessage {
    id: TaskMessageId,
    task_id: TaskId,
    topic_id: TopicId,
    sender: MessageRole,
    receiver: MessageRole,
    message_type: MessageType,
    content: String,
    status: Option<TaskStatus>,
    steps: Option<Value>,
    tool: Option<Value>,
    attachments: Option<Value>,
    event: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskMessageData {
    /// Persisted message identifier.
    pub id: TaskMessageId,
    /// Task the entry belongs to.
    pub task_id: TaskId,
    /// Topic the task belongs to.
    pub topic_id: TopicId,
    /// Sender role.
    pub sender: MessageRole,
    /// Receiver role.
    pub receiver: MessageRole,
    /// Entry kind.
    pub message_type: MessageType,
    /// Entry text.
    pub content: String,
    /// Task status reported alongside the entry.
    pub status: Option<TaskStatus>,
    /// Plan steps reported by the agent.
    pub steps: Option<Value>,
    /// Tool invocation details.
    pub tool: Option<Value>,
    /// Attachments carried by the entry.
    pub attachments: Option<Value>,
    /// Name of the sandbox event that produced the entry.
    pub event: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TaskMessage {
    /// Creates a transcript entry for `task` sent by `sender`.
    #[must_use]
    pub fn new(
        task: &Task,
        sender: MessageRole,
        message_type: MessageType,
        content: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: TaskMessageId::new(),
            task_id: task.id(),
            topic_id: task.topic_id(),
            sender,
            receiver: sender.counterpart(),
            message_type,
            content: content.into(),
            status: None,
            steps: None,
            tool: None,
            attachments: None,
            event: None,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a transcript entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskMessageData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            topic_id: data.topic_id,
            sender: data.sender,
            receiver: data.receiver,
            message_type: data.message_type,
            content: data.content,
            status: data.status,
            steps: data.steps,
            tool: data.tool,
            attachments: data.attachments,
            event: data.event,
            created_at: data.created_at,
        }
    }

    /// Sets the task status reported alongside the entry.
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

    /// Sets the tool invocation details.
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

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> TaskMessageId {
        self.id
    }

    /// Returns the task the entry belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the topic the task belongs to.
    #[must_use]
    pub const fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    /// Returns the sender role.
    #[must_use]
    pub const fn sender(&self) -> MessageRole {
        self.sender
    }

    /// Returns the receiver role.
    #[must_use]
    pub const fn receiver(&self) -> MessageRole {
        self.receiver
    }

    /// Returns the entry kind.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Returns the entry text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the task status reported alongside the entry.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the plan steps.
    #[must_use]
    pub const fn steps(&self) -> Option<&Value> {
        self.steps.as_ref()
    }

    /// Returns the tool invocation details.
    #[must_use]
    pub const fn tool(&self) -> Option<&Value> {
        self.tool.as_ref()
    }

    /// Returns the attachments.
    #[must_use]
    pub const fn attachments(&self) -> Option<&Value> {
        self.attachments.as_ref()
    }

    /// Returns the sandbox event name.
    #[must_use]
    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
