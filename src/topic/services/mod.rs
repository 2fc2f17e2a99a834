//! Application services for topic lifecycle management.

mod lifecycle;

pub use lifecycle::{CreateTopicRequest, TopicDomainService, TopicServiceError, TopicServiceResult};
