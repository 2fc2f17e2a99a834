//! `PostgreSQL` adapter for workspace persistence.

mod models;
mod repository;
mod schema;

pub use repository::PostgresWorkspaceRepository;
