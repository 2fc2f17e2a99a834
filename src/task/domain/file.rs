//! Files produced or consumed while a task runs.

use super::{FileKey, ParseTaskAttributeError, TaskDomainError, TaskFileId, TaskId};
use crate::isolation::{DataIsolation, OrganizationCode, UserId};
use crate::topic::domain::TopicId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a file plays in a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFileType {
    /// Intermediate artefact written while the task runs.
    #[default]
    Process,
    /// Deliverable produced when the task finishes.
    Final,
    /// File uploaded by the user.
    UserUpload,
    /// Screenshot captured by the sandbox browser.
    BrowserScreenshot,
    /// Anything else.
    Other,
}

impl TaskFileType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Final => "final",
            Self::UserUpload => "user_upload",
            Self::BrowserScreenshot => "browser_screenshot",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TaskFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskFileType {
    type Error = ParseTaskAttributeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "process" => Ok(Self::Process),
            "final" => Ok(Self::Final),
            "user_upload" => Ok(Self::UserUpload),
            "browser_screenshot" => Ok(Self::BrowserScreenshot),
            "other" => Ok(Self::Other),
            _ => Err(ParseTaskAttributeError::new("task file type", value)),
        }
    }
}

/// Where the file bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Shared workspace storage.
    #[default]
    Workspace,
    /// Storage scoped to a single topic.
    Topic,
    /// External object storage reached through a URL.
    ObjectStorage,
}

impl StorageType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Topic => "topic",
            Self::ObjectStorage => "object_storage",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for StorageType {
    type Error = ParseTaskAttributeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "workspace" => Ok(Self::Workspace),
            "topic" => Ok(Self::Topic),
            "object_storage" => Ok(Self::ObjectStorage),
            _ => Err(ParseTaskAttributeError::new("storage type", value)),
        }
    }
}

/// Metadata reported by a file producer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskFileData {
    /// File name including extension.
    pub file_name: String,
    /// Extension without the leading dot; derived from the name when empty.
    pub file_extension: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Storage backend.
    pub storage_type: StorageType,
    /// Externally reachable URL, if any.
    pub external_url: Option<String>,
}

impl TaskFileData {
    /// Creates file metadata for `file_name` with the given size.
    #[must_use]
    pub fn new(file_name: impl Into<String>, file_size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            ..Self::default()
        }
    }

    /// Sets the storage backend.
    #[must_use]
    pub const fn with_storage_type(mut self, storage_type: StorageType) -> Self {
        self.storage_type = storage_type;
        self
    }

    /// Sets the external URL.
    #[must_use]
    pub fn with_external_url(mut self, external_url: impl Into<String>) -> Self {
        self.external_url = Some(external_url.into());
        self
    }
}

/// A file registered against a task, unique per live file key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFile {
    id: TaskFileId,
    file_key: FileKey,
    user_id: UserId,
    organization_code: OrganizationCode,
    topic_id: TopicId,
    task_id: TaskId,
    file_type: TaskFileType,
    file_name: String,
    file_extension: String,
    file_size: u64,
    storage_type: StorageType,
    external_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted task file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskFileData {
    /// Persisted file identifier.
    pub id: TaskFileId,
    /// Idempotency key.
    pub file_key: FileKey,
    /// Owning user.
    pub user_id: UserId,
    /// Owning organization.
    pub organization_code: OrganizationCode,
    /// Topic the file belongs to.
    pub topic_id: TopicId,
    /// Task that registered the file.
    pub task_id: TaskId,
    /// Role the file plays.
    pub file_type: TaskFileType,
    /// File name.
    pub file_name: String,
    /// Extension without the leading dot.
    pub file_extension: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Storage backend.
    pub storage_type: StorageType,
    /// Externally reachable URL, if any.
    pub external_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion timestamp, if deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Identifies the task a file is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFileOwner {
    /// Topic the file belongs to.
    pub topic_id: TopicId,
    /// Task that registered the file.
    pub task_id: TaskId,
}

impl TaskFile {
    /// Largest size the storage column can hold.
    pub const MAX_FILE_SIZE: u64 = i64::MAX as u64;

    /// Creates a file record from producer metadata.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyFileName`] for blank names or
    /// [`TaskDomainError::FileTooLarge`] when the size exceeds
    /// [`Self::MAX_FILE_SIZE`].
    pub fn new(
        file_key: FileKey,
        isolation: &DataIsolation,
        owner: TaskFileOwner,
        file_type: TaskFileType,
        data: TaskFileData,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let file_name = data.file_name.trim().to_owned();
        if file_name.is_empty() {
            return Err(TaskDomainError::EmptyFileName);
        }
        if data.file_size > Self::MAX_FILE_SIZE {
            return Err(TaskDomainError::FileTooLarge(data.file_size));
        }
        let file_extension = if data.file_extension.trim().is_empty() {
            extension_of(&file_name)
        } else {
            data.file_extension.trim().trim_start_matches('.').to_owned()
        };
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskFileId::new(),
            file_key,
            user_id: isolation.user_id().clone(),
            organization_code: isolation.organization_code().clone(),
            topic_id: owner.topic_id,
            task_id: owner.task_id,
            file_type,
            file_name,
            file_extension,
            file_size: data.file_size,
            storage_type: data.storage_type,
            external_url: data.external_url,
            created_at: timestamp,
            updated_at: timestamp,
            deleted_at: None,
        })
    }

    /// Reconstructs a file record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskFileData) -> Self {
        Self {
            id: data.id,
            file_key: data.file_key,
            user_id: data.user_id,
            organization_code: data.organization_code,
            topic_id: data.topic_id,
            task_id: data.task_id,
            file_type: data.file_type,
            file_name: data.file_name,
            file_extension: data.file_extension,
            file_size: data.file_size,
            storage_type: data.storage_type,
            external_url: data.external_url,
            created_at: data.created_at,
            updated_at: data.updated_at,
            deleted_at: data.deleted_at,
        }
    }

    /// Returns the file identifier.
    #[must_use]
    pub const fn id(&self) -> TaskFileId {
        self.id
    }

    /// Returns the idempotency key.
    #[must_use]
    pub const fn file_key(&self) -> &FileKey {
        &self.file_key
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

    /// Returns the topic the file belongs to.
    #[must_use]
    pub const fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    /// Returns the task that registered the file.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the role the file plays.
    #[must_use]
    pub const fn file_type(&self) -> TaskFileType {
        self.file_type
    }

    /// Returns the file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the extension without the leading dot.
    #[must_use]
    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    /// Returns the size in bytes.
    #[must_use]
    pub const fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Returns the storage backend.
    #[must_use]
    pub const fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    /// Returns the external URL, if any.
    #[must_use]
    pub fn external_url(&self) -> Option<&str> {
        self.external_url.as_deref()
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
}

fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .filter(|(stem, _)| !stem.is_empty())
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .unwrap_or_default()
}
