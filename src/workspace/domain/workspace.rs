//! Workspace aggregate root.

use super::{ArchiveStatus, WorkspaceDomainError, WorkspaceId, WorkspaceName, WorkspaceStatus};
use crate::isolation::{DataIsolation, OrganizationCode, UserId};
use crate::topic::domain::TopicId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Workspace aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    id: WorkspaceId,
    user_id: UserId,
    organization_code: OrganizationCode,
    name: WorkspaceName,
    archive_status: ArchiveStatus,
    status: WorkspaceStatus,
    current_topic_id: Option<TopicId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedWorkspaceData {
    /// Persisted workspace identifier.
    pub id: WorkspaceId,
    /// Owning user.
    pub user_id: UserId,
    /// Owning organization.
    pub organization_code: OrganizationCode,
    /// Display name.
    pub name: WorkspaceName,
    /// Archive flag.
    pub archive_status: ArchiveStatus,
    /// Administrative status.
    pub status: WorkspaceStatus,
    /// Weak pointer to the most recently used topic.
    pub current_topic_id: Option<TopicId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion timestamp, if deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Workspace {
    /// Creates a new workspace owned by the caller.
    #[must_use]
    pub fn new(isolation: &DataIsolation, name: WorkspaceName, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: WorkspaceId::new(),
            user_id: isolation.user_id().clone(),
            organization_code: isolation.organization_code().clone(),
            name,
            archive_status: ArchiveStatus::NotArchived,
            status: WorkspaceStatus::Active,
            current_topic_id: None,
            created_at: timestamp,
            updated_at: timestamp,
            deleted_at: None,
        }
    }

    /// Reconstructs a workspace from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedWorkspaceData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            organization_code: data.organization_code,
            name: data.name,
            archive_status: data.archive_status,
            status: data.status,
            current_topic_id: data.current_topic_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
            deleted_at: data.deleted_at,
        }
    }

    /// Returns the workspace identifier.
    #[must_use]
    pub const fn id(&self) -> WorkspaceId {
        self.id
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

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &WorkspaceName {
        &self.name
    }

    /// Returns the archive flag.
    #[must_use]
    pub const fn archive_status(&self) -> ArchiveStatus {
        self.archive_status
    }

    /// Returns the administrative status.
    #[must_use]
    pub const fn status(&self) -> WorkspaceStatus {
        self.status
    }

    /// Returns the weak pointer to the most recently used topic.
    #[must_use]
    pub const fn current_topic_id(&self) -> Option<TopicId> {
        self.current_topic_id
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

    /// Returns `true` when the workspace is archived.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.archive_status == ArchiveStatus::Archived
    }

    /// Returns `true` when the caller owns this workspace.
    #[must_use]
    pub fn is_owned_by(&self, isolation: &DataIsolation) -> bool {
        isolation.owns(&self.user_id, &self.organization_code)
    }

    /// Fails when the workspace may not receive new topics or tasks.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::Archived`] for archived workspaces.
    pub fn ensure_accepts_new_work(&self) -> Result<(), WorkspaceDomainError> {
        if self.is_archived() {
            return Err(WorkspaceDomainError::Archived(self.id));
        }
        Ok(())
    }

    /// Renames the workspace.
    pub fn rename(&mut self, name: WorkspaceName, clock: &impl Clock) {
        self.name = name;
        self.touch(clock);
    }

    /// Archives or restores the workspace.
    pub fn set_archive_status(&mut self, archive_status: ArchiveStatus, clock: &impl Clock) {
        self.archive_status = archive_status;
        self.touch(clock);
    }

    /// Changes the administrative status.
    pub fn set_status(&mut self, status: WorkspaceStatus, clock: &impl Clock) {
        self.status = status;
        self.touch(clock);
    }

    /// Points the workspace at its most recently used topic.
    pub fn set_current_topic(&mut self, topic_id: Option<TopicId>, clock: &impl Clock) {
        self.current_topic_id = topic_id;
        self.touch(clock);
    }

    /// Marks the workspace as soft-deleted at `deleted_at`.
    pub fn mark_deleted(&mut self, deleted_at: DateTime<Utc>) {
        self.deleted_at = Some(deleted_at);
        self.updated_at = deleted_at;
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
