//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating task domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The status change is not permitted by the task state machine.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Task whose status was being changed.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The external task identifier is empty after trimming.
    #[error("external task id must not be empty")]
    EmptyExternalTaskId,

    /// The file key is empty after trimming.
    #[error("file key must not be empty")]
    EmptyFileKey,

    /// The file name is empty after trimming.
    #[error("file name must not be empty")]
    EmptyFileName,

    /// The file size does not fit the storage column.
    #[error("file size {0} exceeds the supported maximum")]
    FileTooLarge(u64),
}

/// Error returned while parsing task status values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task mode values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task mode: {0}")]
pub struct ParseTaskModeError(pub String);

/// Error returned while parsing task instruction values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task instruction: {0}")]
pub struct ParseTaskInstructionError(pub String);

/// Error returned while parsing file or message classification values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {attribute}: {value}")]
pub struct ParseTaskAttributeError {
    /// Name of the attribute being parsed.
    pub attribute: &'static str,
    /// Rejected input.
    pub value: String,
}

impl ParseTaskAttributeError {
    pub(crate) fn new(attribute: &'static str, value: &str) -> Self {
        Self {
            attribute,
            value: value.to_owned(),
        }
    }
}
