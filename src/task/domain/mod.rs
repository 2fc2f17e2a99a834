//! Domain model for task orchestration.
//!
//! Tasks carry the only true execution state machine in the core. Files and
//! transcript entries hang off a task; files are deduplicated by file key
//! and transcript entries are append-only.

mod error;
mod file;
mod ids;
mod message;
mod status;
mod task;

pub use error::{
    ParseTaskAttributeError, ParseTaskInstructionError, ParseTaskModeError, ParseTaskStatusError,
    TaskDomainError,
};
pub use file::{
    PersistedTaskFileData, StorageType, TaskFile, TaskFileData, TaskFileOwner, TaskFileType,
};
pub use ids::{ExternalTaskId, FileKey, TaskFileId, TaskId, TaskMessageId};
pub use message::{MessageRole, MessageType, PersistedTaskMessageData, TaskMessage};
pub use status::{TaskInstruction, TaskMode, TaskStatus};
pub use task::{PersistedTaskData, Task};
