//! In-memory task repositories for tests and local runs.

mod file;
mod message;
mod task;

pub use file::InMemoryTaskFileRepository;
pub use message::InMemoryTaskMessageRepository;
pub use task::InMemoryTaskRepository;
