//! `PostgreSQL` adapters for task, task file and transcript persistence.

mod file_repository;
mod message_repository;
mod models;
mod repository;
mod schema;

pub use file_repository::PostgresTaskFileRepository;
pub use message_repository::PostgresTaskMessageRepository;
pub use repository::PostgresTaskRepository;
