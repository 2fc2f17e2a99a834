//! Domain model for topics.

mod error;
mod ids;
mod topic;

pub use error::TopicDomainError;
pub use ids::{ChatBinding, ChatConversationId, ChatTopicId, TopicId, TopicName};
pub use topic::{PersistedTopicData, Topic};
