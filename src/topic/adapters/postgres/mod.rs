//! `PostgreSQL` adapter for topic persistence.

mod models;
mod repository;
mod schema;

pub use repository::PostgresTopicRepository;
