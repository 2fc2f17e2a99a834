//! Repository port for topic persistence.

use crate::isolation::UserId;
use crate::topic::domain::{ChatTopicId, Topic, TopicId};
use crate::workspace::domain::WorkspaceId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for topic repository operations.
pub type TopicRepositoryResult<T> = Result<T, TopicRepositoryError>;

/// Topic persistence contract.
///
/// Soft-deleted topics are invisible to every lookup.
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Stores a new topic.
    ///
    /// # Errors
    ///
    /// Returns [`TopicRepositoryError::DuplicateTopic`] when the identifier
    /// exists, or [`TopicRepositoryError::DuplicateChatTopic`] when a live
    /// topic is already bound to the same user and chat topic.
    async fn store(&self, topic: &Topic) -> TopicRepositoryResult<()>;

    /// Persists changes to an existing topic.
    ///
    /// # Errors
    ///
    /// Returns [`TopicRepositoryError::NotFound`] when the topic does not
    /// exist or is deleted.
    async fn update(&self, topic: &Topic) -> TopicRepositoryResult<()>;

    /// Finds a live topic by identifier.
    async fn find_by_id(&self, id: TopicId) -> TopicRepositoryResult<Option<Topic>>;

    /// Finds the live topic a user has bound to a chat topic.
    async fn find_by_chat_topic_id(
        &self,
        user_id: &UserId,
        chat_topic_id: &ChatTopicId,
    ) -> TopicRepositoryResult<Option<Topic>>;

    /// Lists live topics in a workspace, oldest first.
    async fn list_by_workspace(
        &self,
        workspace_id: WorkspaceId,
    ) -> TopicRepositoryResult<Vec<Topic>>;

    /// Soft-deletes a topic.
    ///
    /// Returns `false` when no live topic had the identifier.
    async fn soft_delete(&self, id: TopicId, deleted_at: DateTime<Utc>)
    -> TopicRepositoryResult<bool>;

    /// Soft-deletes every live topic in a workspace, returning the count.
    async fn soft_delete_by_workspace(
        &self,
        workspace_id: WorkspaceId,
        deleted_at: DateTime<Utc>,
    ) -> TopicRepositoryResult<u64>;
}

/// Errors returned by topic repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TopicRepositoryError {
    /// A topic with the same identifier already exists.
    #[error("duplicate topic identifier: {0}")]
    DuplicateTopic(TopicId),

    /// A live topic is already bound to the chat topic.
    #[error("chat topic {0} is already bound to a topic")]
    DuplicateChatTopic(ChatTopicId),

    /// The topic was not found.
    #[error("topic not found: {0}")]
    NotFound(TopicId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TopicRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
