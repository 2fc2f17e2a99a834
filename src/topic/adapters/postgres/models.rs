//! Diesel row models for topic persistence.

use super::schema::topics;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Row model for topic records, used for reads, inserts and full updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = topics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TopicRow {
    /// Topic identifier.
    pub id: uuid::Uuid,
    /// Owning workspace.
    pub workspace_id: uuid::Uuid,
    /// Owning user.
    pub user_id: String,
    /// Owning organization.
    pub organization_code: String,
    /// Chat-layer conversation identifier.
    pub chat_conversation_id: String,
    /// Chat-layer topic identifier.
    pub chat_topic_id: String,
    /// Display name.
    pub name: String,
    /// Sticky sandbox.
    pub sandbox_id: Option<String>,
    /// Working directory.
    pub work_dir: String,
    /// Weak pointer to the latest task.
    pub current_task_id: Option<uuid::Uuid>,
    /// Cached status of the latest task.
    pub current_task_status: Option<String>,
    /// Remembered task mode.
    pub task_mode: String,
    /// Opaque sandbox configuration.
    pub sandbox_config: Option<Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}
