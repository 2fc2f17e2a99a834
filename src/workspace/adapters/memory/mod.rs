//! In-memory workspace repository for tests and local runs.

mod repository;

pub use repository::InMemoryWorkspaceRepository;
