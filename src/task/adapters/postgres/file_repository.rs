//! `PostgreSQL` repository implementation for task file registration.

use super::{models::TaskFileRow, schema::task_files};
use crate::isolation::{OrganizationCode, UserId};
use crate::postgres::{PgPool, run_blocking};
use crate::task::{
    domain::{
        FileKey, PersistedTaskFileData, StorageType, TaskFile, TaskFileId, TaskFileType, TaskId,
    },
    ports::{TaskFileRepository, TaskFileRepositoryError, TaskFileRepositoryResult},
};
use crate::topic::domain::TopicId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

/// `PostgreSQL`-backed task file repository.
///
/// Relies on the partial unique index over live `file_key` values.
#[derive(Debug, Clone)]
pub struct PostgresTaskFileRepository {
    pool: PgPool,
}

impl PostgresTaskFileRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskFileRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskFileRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.pool, TaskFileRepositoryError::persistence, f).await
    }
}

#[async_trait]
impl TaskFileRepository for PostgresTaskFileRepository {
    async fn insert_or_ignore(&self, file: &TaskFile) -> TaskFileRepositoryResult<bool> {
        let row = to_row(file)?;
        self.run_blocking(move |connection| {
            let inserted = diesel::insert_into(task_files::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(connection)
                .map_err(TaskFileRepositoryError::persistence)?;
            Ok(inserted == 1)
        })
        .await
    }

    async fn find_by_file_key(
        &self,
        file_key: &FileKey,
    ) -> TaskFileRepositoryResult<Option<TaskFile>> {
        let key = file_key.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = task_files::table
                .filter(task_files::file_key.eq(&key))
                .filter(task_files::deleted_at.is_null())
                .select(TaskFileRow::as_select())
                .first::<TaskFileRow>(connection)
                .optional()
                .map_err(TaskFileRepositoryError::persistence)?;
            row.map(row_to_file).transpose()
        })
        .await
    }

    async fn list_by_task(&self, task_id: TaskId) -> TaskFileRepositoryResult<Vec<TaskFile>> {
        self.run_blocking(move |connection| {
            let rows = task_files::table
                .filter(task_files::task_id.eq(task_id.into_inner()))
                .filter(task_files::deleted_at.is_null())
                .order(task_files::created_at.asc())
                .select(TaskFileRow::as_select())
                .load::<TaskFileRow>(connection)
                .map_err(TaskFileRepositoryError::persistence)?;
            rows.into_iter().map(row_to_file).collect()
        })
        .await
    }
}

fn to_row(file: &TaskFile) -> TaskFileRepositoryResult<TaskFileRow> {
    Ok(TaskFileRow {
        id: file.id().into_inner(),
        file_key: file.file_key().as_str().to_owned(),
        user_id: file.user_id().as_str().to_owned(),
        organization_code: file.organization_code().as_str().to_owned(),
        topic_id: file.topic_id().into_inner(),
        task_id: file.task_id().into_inner(),
        file_type: file.file_type().as_str().to_owned(),
        file_name: file.file_name().to_owned(),
        file_extension: file.file_extension().to_owned(),
        file_size: i64::try_from(file.file_size()).map_err(TaskFileRepositoryError::persistence)?,
        storage_type: file.storage_type().as_str().to_owned(),
        external_url: file.external_url().map(str::to_owned),
        created_at: file.created_at(),
        updated_at: file.updated_at(),
        deleted_at: file.deleted_at(),
    })
}

fn row_to_file(row: TaskFileRow) -> TaskFileRepositoryResult<TaskFile> {
    let TaskFileRow {
        id,
        file_key,
        user_id,
        organization_code,
        topic_id,
        task_id,
        file_type,
        file_name,
        file_extension,
        file_size,
        storage_type,
        external_url,
        created_at,
        updated_at,
        deleted_at,
    } = row;

    let data = PersistedTaskFileData {
        id: TaskFileId::from_uuid(id),
        file_key: FileKey::new(file_key).map_err(TaskFileRepositoryError::persistence)?,
        user_id: UserId::new(user_id).map_err(TaskFileRepositoryError::persistence)?,
        organization_code: OrganizationCode::new(organization_code)
            .map_err(TaskFileRepositoryError::persistence)?,
        topic_id: TopicId::from_uuid(topic_id),
        task_id: TaskId::from_uuid(task_id),
        file_type: TaskFileType::try_from(file_type.as_str())
            .map_err(TaskFileRepositoryError::persistence)?,
        file_name,
        file_extension,
        file_size: u64::try_from(file_size).map_err(TaskFileRepositoryError::persistence)?,
        storage_type: StorageType::try_from(storage_type.as_str())
            .map_err(TaskFileRepositoryError::persistence)?,
        external_url,
        created_at,
        updated_at,
        deleted_at,
    };
    Ok(TaskFile::from_persisted(data))
}
