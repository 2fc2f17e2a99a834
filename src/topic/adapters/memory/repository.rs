//! Thread-safe in-memory topic repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::isolation::UserId;
use crate::topic::{
    domain::{ChatTopicId, Topic, TopicId},
    ports::{TopicRepository, TopicRepositoryError, TopicRepositoryResult},
};
use crate::workspace::domain::WorkspaceId;

/// Thread-safe in-memory topic repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTopicRepository {
    topics: Arc<RwLock<HashMap<TopicId, Topic>>>,
}

impl InMemoryTopicRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a topic whether or not it has been soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn find_including_deleted(&self, id: TopicId) -> TopicRepositoryResult<Option<Topic>> {
        let topics = self.topics.read().map_err(poisoned)?;
        Ok(topics.get(&id).cloned())
    }
}

fn poisoned(err: impl std::fmt::Display) -> TopicRepositoryError {
    TopicRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn is_live(topic: &Topic) -> bool {
    topic.deleted_at().is_none()
}

fn is_bound_to(topic: &Topic, user_id: &UserId, chat_topic_id: &ChatTopicId) -> bool {
    topic.user_id() == user_id && topic.chat().topic_id() == chat_topic_id
}

#[async_trait]
impl TopicRepository for InMemoryTopicRepository {
    async fn store(&self, topic: &Topic) -> TopicRepositoryResult<()> {
        let mut topics = self.topics.write().map_err(poisoned)?;
        if topics.contains_key(&topic.id()) {
            return Err(TopicRepositoryError::DuplicateTopic(topic.id()));
        }
        let chat_topic_id = topic.chat().topic_id();
        if topics.values().any(|existing| {
            is_live(existing) && is_bound_to(existing, topic.user_id(), chat_topic_id)
        }) {
            return Err(TopicRepositoryError::DuplicateChatTopic(
                chat_topic_id.clone(),
            ));
        }
        topics.insert(topic.id(), topic.clone());
        Ok(())
    }

    async fn update(&self, topic: &Topic) -> TopicRepositoryResult<()> {
        let mut topics = self.topics.write().map_err(poisoned)?;
        let existing = topics
            .get_mut(&topic.id())
            .filter(|existing| is_live(existing))
            .ok_or(TopicRepositoryError::NotFound(topic.id()))?;
        *existing = topic.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: TopicId) -> TopicRepositoryResult<Option<Topic>> {
        let topics = self.topics.read().map_err(poisoned)?;
        Ok(topics.get(&id).filter(|topic| is_live(topic)).cloned())
    }

    async fn find_by_chat_topic_id(
        &self,
        user_id: &UserId,
        chat_topic_id: &ChatTopicId,
    ) -> TopicRepositoryResult<Option<Topic>> {
        let topics = self.topics.read().map_err(poisoned)?;
        Ok(topics
            .values()
            .find(|topic| is_live(topic) && is_bound_to(topic, user_id, chat_topic_id))
            .cloned())
    }

    async fn list_by_workspace(
        &self,
        workspace_id: WorkspaceId,
    ) -> TopicRepositoryResult<Vec<Topic>> {
        let topics = self.topics.read().map_err(poisoned)?;
        let mut found: Vec<Topic> = topics
            .values()
            .filter(|topic| is_live(topic) && topic.workspace_id() == workspace_id)
            .cloned()
            .collect();
        found.sort_by_key(Topic::created_at);
        Ok(found)
    }

    async fn soft_delete(
        &self,
        id: TopicId,
        deleted_at: DateTime<Utc>,
    ) -> TopicRepositoryResult<bool> {
        let mut topics = self.topics.write().map_err(poisoned)?;
        match topics.get_mut(&id).filter(|topic| is_live(topic)) {
            Some(topic) => {
                topic.mark_deleted(deleted_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete_by_workspace(
        &self,
        workspace_id: WorkspaceId,
        deleted_at: DateTime<Utc>,
    ) -> TopicRepositoryResult<u64> {
        let mut topics = self.topics.write().map_err(poisoned)?;
        let mut deleted = 0;
        for topic in topics
            .values_mut()
            .filter(|topic| is_live(topic) && topic.workspace_id() == workspace_id)
        {
            topic.mark_deleted(deleted_at);
            deleted += 1;
        }
        Ok(deleted)
    }
}
