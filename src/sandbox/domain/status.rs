//! Sandbox liveness as reported by the gateway.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway response code signalling that the sandbox was found.
pub const GATEWAY_SUCCESS_CODE: i64 = 1000;

/// Runtime status of a sandbox container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxStatus {
    /// The container is being scheduled or booted.
    Pending,
    /// The container is up and accepting sessions.
    Running,
    /// The container has stopped.
    Exited,
    /// Any status this crate does not recognise.
    #[serde(other)]
    Unknown,
}

impl SandboxStatus {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Exited => "exited",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a gateway status string, folding unrecognised values into
    /// [`SandboxStatus::Unknown`].
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "exited" => Self::Exited,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for SandboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a gateway liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxProbe {
    code: i64,
    status: Option<SandboxStatus>,
}

impl SandboxProbe {
    /// Creates a probe result from the gateway response code and status.
    #[must_use]
    pub const fn new(code: i64, status: Option<SandboxStatus>) -> Self {
        Self { code, status }
    }

    /// Probe result for a sandbox the gateway reports as running.
    #[must_use]
    pub const fn running() -> Self {
        Self::new(GATEWAY_SUCCESS_CODE, Some(SandboxStatus::Running))
    }

    /// Probe result for a sandbox the gateway does not know about.
    #[must_use]
    pub const fn not_found(code: i64) -> Self {
        Self::new(code, None)
    }

    /// Returns the gateway response code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// Returns the reported status, if the sandbox was found.
    #[must_use]
    pub const fn status(&self) -> Option<SandboxStatus> {
        self.status
    }

    /// Returns `true` when the gateway found the sandbox.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.code == GATEWAY_SUCCESS_CODE
    }

    /// Returns `true` when the sandbox exists and is accepting sessions.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.exists() && self.status == Some(SandboxStatus::Running)
    }
}
