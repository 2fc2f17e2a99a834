//! Error types for topic domain validation.

use thiserror::Error;

/// Errors returned while constructing topic domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TopicDomainError {
    /// The chat conversation identifier is empty after trimming.
    #[error("chat conversation id must not be empty")]
    EmptyChatConversationId,

    /// The chat topic identifier is empty after trimming.
    #[error("chat topic id must not be empty")]
    EmptyChatTopicId,

    /// The topic name exceeds the storage limit.
    #[error("topic name exceeds {max} characters")]
    NameTooLong {
        /// Maximum allowed length in characters.
        max: usize,
    },
}
