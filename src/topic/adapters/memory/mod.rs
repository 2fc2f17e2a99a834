//! In-memory topic repository for tests and local runs.

mod repository;

pub use repository::InMemoryTopicRepository;
