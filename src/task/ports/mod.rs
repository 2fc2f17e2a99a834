//! Port contracts for task, task file and transcript persistence.

pub mod file_repository;
pub mod message_repository;
pub mod repository;

pub use file_repository::{
    TaskFileRepository, TaskFileRepositoryError, TaskFileRepositoryResult,
};
pub use message_repository::{
    TaskMessageRepository, TaskMessageRepositoryError, TaskMessageRepositoryResult,
};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
