//! `PostgreSQL` repository implementation for workspace storage.

use super::{models::WorkspaceRow, schema::workspaces};
use crate::isolation::{DataIsolation, OrganizationCode, UserId};
use crate::postgres::{PgPool, run_blocking};
use crate::topic::domain::TopicId;
use crate::workspace::{
    domain::{
        ArchiveStatus, PersistedWorkspaceData, Workspace, WorkspaceId, WorkspaceName,
        WorkspaceStatus,
    },
    ports::{WorkspaceRepository, WorkspaceRepositoryError, WorkspaceRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed workspace repository.
#[derive(Debug, Clone)]
pub struct PostgresWorkspaceRepository {
    pool: PgPool,
}

impl PostgresWorkspaceRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkspaceRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkspaceRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.pool, WorkspaceRepositoryError::persistence, f).await
    }
}

#[async_trait]
impl WorkspaceRepository for PostgresWorkspaceRepository {
    async fn store(&self, workspace: &Workspace) -> WorkspaceRepositoryResult<()> {
        let workspace_id = workspace.id();
        let row = to_row(workspace);
        self.run_blocking(move |connection| {
            diesel::insert_into(workspaces::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        WorkspaceRepositoryError::DuplicateWorkspace(workspace_id)
                    }
                    _ => WorkspaceRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, workspace: &Workspace) -> WorkspaceRepositoryResult<()> {
        let workspace_id = workspace.id();
        let row = to_row(workspace);
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                workspaces::table
                    .filter(workspaces::id.eq(workspace_id.into_inner()))
                    .filter(workspaces::deleted_at.is_null()),
            )
            .set(&row)
            .execute(connection)
            .map_err(WorkspaceRepositoryError::persistence)?;
            if updated == 0 {
                return Err(WorkspaceRepositoryError::NotFound(workspace_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: WorkspaceId) -> WorkspaceRepositoryResult<Option<Workspace>> {
        self.run_blocking(move |connection| {
            let row = workspaces::table
                .filter(workspaces::id.eq(id.into_inner()))
                .filter(workspaces::deleted_at.is_null())
                .select(WorkspaceRow::as_select())
                .first::<WorkspaceRow>(connection)
                .optional()
                .map_err(WorkspaceRepositoryError::persistence)?;
            row.map(row_to_workspace).transpose()
        })
        .await
    }

    async fn list_by_owner(
        &self,
        isolation: &DataIsolation,
    ) -> WorkspaceRepositoryResult<Vec<Workspace>> {
        let user = isolation.user_id().as_str().to_owned();
        let organization = isolation.organization_code().as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = workspaces::table
                .filter(workspaces::user_id.eq(&user))
                .filter(workspaces::organization_code.eq(&organization))
                .filter(workspaces::deleted_at.is_null())
                .order(workspaces::created_at.asc())
                .select(WorkspaceRow::as_select())
                .load::<WorkspaceRow>(connection)
                .map_err(WorkspaceRepositoryError::persistence)?;
            rows.into_iter().map(row_to_workspace).collect()
        })
        .await
    }

    async fn soft_delete(
        &self,
        id: WorkspaceId,
        deleted_at: DateTime<Utc>,
    ) -> WorkspaceRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::update(
                workspaces::table
                    .filter(workspaces::id.eq(id.into_inner()))
                    .filter(workspaces::deleted_at.is_null()),
            )
            .set((
                workspaces::deleted_at.eq(Some(deleted_at)),
                workspaces::updated_at.eq(deleted_at),
            ))
            .execute(connection)
            .map_err(WorkspaceRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }
}

fn to_row(workspace: &Workspace) -> WorkspaceRow {
    WorkspaceRow {
        id: workspace.id().into_inner(),
        user_id: workspace.user_id().as_str().to_owned(),
        organization_code: workspace.organization_code().as_str().to_owned(),
        name: workspace.name().as_str().to_owned(),
        archive_status: workspace.archive_status().as_str().to_owned(),
        status: workspace.status().as_str().to_owned(),
        current_topic_id: workspace.current_topic_id().map(TopicId::into_inner),
        created_at: workspace.created_at(),
        updated_at: workspace.updated_at(),
        deleted_at: workspace.deleted_at(),
    }
}

fn row_to_workspace(row: WorkspaceRow) -> WorkspaceRepositoryResult<Workspace> {
    let data = PersistedWorkspaceData {
        id: WorkspaceId::from_uuid(row.id),
        user_id: UserId::new(row.user_id).map_err(WorkspaceRepositoryError::persistence)?,
        organization_code: OrganizationCode::new(row.organization_code)
            .map_err(WorkspaceRepositoryError::persistence)?,
        name: WorkspaceName::new(row.name).map_err(WorkspaceRepositoryError::persistence)?,
        archive_status: ArchiveStatus::try_from(row.archive_status.as_str())
            .map_err(WorkspaceRepositoryError::persistence)?,
        status: WorkspaceStatus::try_from(row.status.as_str())
            .map_err(WorkspaceRepositoryError::persistence)?,
        current_topic_id: row.current_topic_id.map(TopicId::from_uuid),
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
    };
    Ok(Workspace::from_persisted(data))
}
