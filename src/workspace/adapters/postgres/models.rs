//! Diesel row models for workspace persistence.

use super::schema::workspaces;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for workspace records, used for reads, inserts and full updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = workspaces)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct WorkspaceRow {
    /// Workspace identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub user_id: String,
    /// Owning organization.
    pub organization_code: String,
    /// Display name.
    pub name: String,
    /// Archive flag.
    pub archive_status: String,
    /// Administrative status.
    pub status: String,
    /// Weak pointer to the most recently used topic.
    pub current_topic_id: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}
