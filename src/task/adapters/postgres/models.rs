//! Diesel row models for task persistence.

use super::schema::{task_files, task_messages, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Row model for task records, used for reads, inserts and full updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Identifier assigned by the sandbox.
    pub external_task_id: Option<String>,
    /// Owning user.
    pub user_id: String,
    /// Owning organization.
    pub organization_code: String,
    /// Workspace containing the topic.
    pub workspace_id: uuid::Uuid,
    /// Owning topic.
    pub topic_id: uuid::Uuid,
    /// Bound sandbox.
    pub sandbox_id: Option<String>,
    /// Execution mode.
    pub task_mode: String,
    /// Prompt text.
    pub prompt: String,
    /// Serialized attachments.
    pub attachments: Option<Value>,
    /// Execution status.
    pub status: String,
    /// Working directory.
    pub work_dir: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Row model for task file records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskFileRow {
    /// File identifier.
    pub id: uuid::Uuid,
    /// Idempotency key.
    pub file_key: String,
    /// Owning user.
    pub user_id: String,
    /// Owning organization.
    pub organization_code: String,
    /// Topic the file belongs to.
    pub topic_id: uuid::Uuid,
    /// Task that registered the file.
    pub task_id: uuid::Uuid,
    /// File role.
    pub file_type: String,
    /// File name.
    pub file_name: String,
    /// Extension.
    pub file_extension: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Storage backend.
    pub storage_type: String,
    /// External URL.
    pub external_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Row model for transcript entries. The insertion sequence is assigned by
/// the database and never read back.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskMessageRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Task the entry belongs to.
    pub task_id: uuid::Uuid,
    /// Topic the task belongs to.
    pub topic_id: uuid::Uuid,
    /// Sender role.
    pub sender: String,
    /// Receiver role.
    pub receiver: String,
    /// Entry kind.
    pub message_type: String,
    /// Entry text.
    pub content: String,
    /// Reported task status.
    pub status: Option<String>,
    /// Plan steps.
    pub steps: Option<Value>,
    /// Tool details.
    pub tool: Option<Value>,
    /// Attachments.
    pub attachments: Option<Value>,
    /// Sandbox event name.
    pub event: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
