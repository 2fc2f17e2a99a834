//! Task status state machine, execution modes and caller instructions.

use super::{ParseTaskInstructionError, ParseTaskModeError, ParseTaskStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status of a task.
///
/// `Waiting` is the only initial state. `Finished`, `Error` and `Stopped`
/// are terminal. `Suspended` may resume to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not yet picked up by a sandbox.
    Waiting,
    /// Executing in a sandbox.
    Running,
    /// Completed successfully.
    Finished,
    /// Failed, or reclaimed after its sandbox went silent.
    Error,
    /// Stopped on request.
    Stopped,
    /// Paused by the sandbox.
    Suspended,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Waiting,
        Self::Running,
        Self::Finished,
        Self::Error,
        Self::Stopped,
        Self::Suspended,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Stopped => "stopped",
            Self::Suspended => "suspended",
        }
    }

    /// Returns `true` for statuses with no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Error | Self::Stopped)
    }

    /// Returns `true` when the state machine permits moving to `next`.
    ///
    /// Staying in the same status is not a transition and returns `false`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Waiting => matches!(next, Self::Running | Self::Error | Self::Stopped),
            Self::Running => matches!(
                next,
                Self::Finished | Self::Error | Self::Stopped | Self::Suspended
            ),
            Self::Suspended => matches!(
                next,
                Self::Running | Self::Finished | Self::Error | Self::Stopped
            ),
            Self::Finished | Self::Error | Self::Stopped => false,
        }
    }

    /// Returns every status from which `self` may be reached.
    pub fn predecessors(self) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |candidate| candidate.can_transition_to(self))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, ParseTaskStatusError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "waiting" => Ok(Self::Waiting),
            "running" => Ok(Self::Running),
            "finished" => Ok(Self::Finished),
            "error" => Ok(Self::Error),
            "stopped" => Ok(Self::Stopped),
            "suspended" => Ok(Self::Suspended),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// How the sandbox should approach a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    /// Conversational execution.
    #[default]
    Chat,
    /// Plan first, then execute.
    Plan,
}

impl TaskMode {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Plan => "plan",
        }
    }
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskMode {
    type Error = ParseTaskModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "plan" => Ok(Self::Plan),
            _ => Err(ParseTaskModeError(value.to_owned())),
        }
    }
}

/// Caller intent carried by an inbound task event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskInstruction {
    /// Start a new task.
    #[default]
    Normal,
    /// Attach to the running task.
    FollowUp,
    /// Stop the running task.
    Interrupted,
}

impl TaskInstruction {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::FollowUp => "follow_up",
            Self::Interrupted => "interrupted",
        }
    }

    /// Returns `true` when the instruction targets an already running task.
    #[must_use]
    pub const fn attaches_to_running_task(self) -> bool {
        matches!(self, Self::FollowUp | Self::Interrupted)
    }
}

impl fmt::Display for TaskInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskInstruction {
    type Error = ParseTaskInstructionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "normal" => Ok(Self::Normal),
            "follow_up" => Ok(Self::FollowUp),
            "interrupted" => Ok(Self::Interrupted),
            _ => Err(ParseTaskInstructionError(value.to_owned())),
        }
    }
}
