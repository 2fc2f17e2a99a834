//! Domain model for workspaces.

mod error;
mod ids;
mod status;
mod workspace;

pub use error::{ParseWorkspaceStatusError, WorkspaceDomainError};
pub use ids::{WorkspaceId, WorkspaceName};
pub use status::{ArchiveStatus, WorkspaceStatus};
pub use workspace::{PersistedWorkspaceData, Workspace};
