//! Control messages sent to a sandbox over its WebSocket session.

use crate::isolation::UserId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Control frame understood by the sandbox agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Asks the sandbox to stop the identified task.
    Interrupt {
        /// User on whose behalf the interrupt is sent.
        user_id: String,
        /// Local identifier of the task to stop.
        task_id: String,
    },
}

impl ControlMessage {
    /// Returns the wire `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Interrupt { .. } => "interrupt",
        }
    }

    /// Serializes the message into its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_payload(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Builds control messages for sandbox sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxMessageBuilder;

impl SandboxMessageBuilder {
    /// Builds an interrupt message for the given user and task.
    #[must_use]
    pub fn interrupt(user_id: &UserId, task_id: impl ToString) -> ControlMessage {
        ControlMessage::Interrupt {
            user_id: user_id.as_str().to_owned(),
            task_id: task_id.to_string(),
        }
    }
}
