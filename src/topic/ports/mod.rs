//! Port contracts for topic persistence.

pub mod repository;

pub use repository::{TopicRepository, TopicRepositoryError, TopicRepositoryResult};
