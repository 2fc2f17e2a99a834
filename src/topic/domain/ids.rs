//! Identifier and validated scalar types for the topic domain.

use super::TopicDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(Uuid);

impl TopicId {
    /// Creates a new random topic identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a topic identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TopicId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for TopicId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation identifier assigned by the chat layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatConversationId(String);

impl ChatConversationId {
    /// Creates a validated conversation identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TopicDomainError::EmptyChatConversationId`] for blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, TopicDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TopicDomainError::EmptyChatConversationId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Topic identifier assigned by the chat layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatTopicId(String);

impl ChatTopicId {
    /// Creates a validated chat topic identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TopicDomainError::EmptyChatTopicId`] for blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, TopicDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TopicDomainError::EmptyChatTopicId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatTopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation keys tying a topic to its chat-layer counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatBinding {
    conversation_id: ChatConversationId,
    topic_id: ChatTopicId,
}

impl ChatBinding {
    /// Creates a binding from validated identifiers.
    #[must_use]
    pub const fn new(conversation_id: ChatConversationId, topic_id: ChatTopicId) -> Self {
        Self {
            conversation_id,
            topic_id,
        }
    }

    /// Creates a binding from raw identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`TopicDomainError`] when either identifier is blank.
    pub fn from_parts(
        conversation_id: impl Into<String>,
        topic_id: impl Into<String>,
    ) -> Result<Self, TopicDomainError> {
        Ok(Self::new(
            ChatConversationId::new(conversation_id)?,
            ChatTopicId::new(topic_id)?,
        ))
    }

    /// Returns the chat conversation identifier.
    #[must_use]
    pub const fn conversation_id(&self) -> &ChatConversationId {
        &self.conversation_id
    }

    /// Returns the chat topic identifier.
    #[must_use]
    pub const fn topic_id(&self) -> &ChatTopicId {
        &self.topic_id
    }
}

/// Display name of a topic. May be empty until the user names it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicName(String);

impl TopicName {
    /// Longest name accepted, in characters.
    pub const MAX_LENGTH: usize = 255;

    /// Creates a validated topic name.
    ///
    /// # Errors
    ///
    /// Returns [`TopicDomainError::NameTooLong`] when the trimmed name exceeds
    /// [`Self::MAX_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TopicDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(TopicDomainError::NameTooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
