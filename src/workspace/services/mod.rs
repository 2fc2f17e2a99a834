//! Application services for workspace lifecycle management.

mod lifecycle;

pub use lifecycle::{
    DEFAULT_WORKSPACE_NAME, WorkspaceDeletion, WorkspaceDomainService, WorkspaceServiceError,
    WorkspaceServiceResult,
};
