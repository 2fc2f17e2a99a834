//! `PostgreSQL` repository implementation for task storage.

use super::{models::TaskRow, schema::tasks};
use crate::isolation::{OrganizationCode, UserId};
use crate::postgres::{PgPool, run_blocking};
use crate::sandbox::domain::SandboxId;
use crate::task::{
    domain::{ExternalTaskId, PersistedTaskData, Task, TaskId, TaskMode, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use crate::topic::domain::TopicId;
use crate::workspace::domain::WorkspaceId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::sql;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Bool;
use uuid::Uuid;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.pool, TaskRepositoryError::persistence, f).await
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_row(task);
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_row(task);
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(task_id.into_inner()))
                    .filter(tasks::deleted_at.is_null()),
            )
            .set(&row)
            .execute(connection)
            .or_else(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    Err(topic_busy(connection, row.topic_id, row.id))
                }
                other => Err(TaskRepositoryError::persistence(other)),
            })?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .filter(tasks::deleted_at.is_null())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_by_external_id(
        &self,
        external_task_id: &ExternalTaskId,
    ) -> TaskRepositoryResult<Option<Task>> {
        let external = external_task_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = find_live_by_external_id(connection, &external)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_running_by_topic(&self, topic_id: TopicId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::topic_id.eq(topic_id.into_inner()))
                .filter(tasks::status.eq(TaskStatus::Running.as_str()))
                .filter(tasks::deleted_at.is_null())
                .order(tasks::created_at.desc())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_by_topic(&self, topic_id: TopicId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::topic_id.eq(topic_id.into_inner()))
                .filter(tasks::deleted_at.is_null())
                .order(tasks::created_at.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn update_status_by_external_id(
        &self,
        external_task_id: &ExternalTaskId,
        status: TaskStatus,
        updated_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let external = external_task_id.as_str().to_owned();
        let mut accepted: Vec<&'static str> =
            status.predecessors().map(TaskStatus::as_str).collect();
        accepted.push(status.as_str());
        self.run_blocking(move |connection| {
            let write = StatusWrite {
                external: &external,
                accepted: &accepted,
                status,
                updated_at,
            };
            if write.execute(connection)? > 0 {
                return Ok(true);
            }

            // Nothing matched: either no live task, a forbidden transition or
            // a running sibling on the same topic.
            let Some(row) = find_live_by_external_id(connection, &external)? else {
                return Ok(false);
            };
            let stored = parse_status(&row.status)?;
            if !accepted.contains(&stored.as_str()) {
                return Err(TaskRepositoryError::InvalidTransition {
                    task_id: TaskId::from_uuid(row.id),
                    from: stored,
                    to: status,
                });
            }
            if running_sibling(connection, row.topic_id, row.id)?.is_some() {
                return Err(topic_busy(connection, row.topic_id, row.id));
            }
            // The sibling stopped between the write and the lookup.
            Ok(write.execute(connection)? > 0)
        })
        .await
    }

    async fn mark_stale_running_as_error(
        &self,
        threshold: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let reclaimed = diesel::update(
                tasks::table
                    .filter(tasks::status.eq(TaskStatus::Running.as_str()))
                    .filter(tasks::deleted_at.is_null())
                    .filter(tasks::updated_at.lt(threshold)),
            )
            .set((
                tasks::status.eq(TaskStatus::Error.as_str()),
                tasks::updated_at.eq(updated_at),
            ))
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            u64::try_from(reclaimed).map_err(TaskRepositoryError::persistence)
        })
        .await
    }

    async fn soft_delete(
        &self,
        id: TaskId,
        deleted_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(id.into_inner()))
                    .filter(tasks::deleted_at.is_null()),
            )
            .set((
                tasks::deleted_at.eq(Some(deleted_at)),
                tasks::updated_at.eq(deleted_at),
            ))
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn soft_delete_by_topic(
        &self,
        topic_id: TopicId,
        deleted_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let deleted = diesel::update(
                tasks::table
                    .filter(tasks::topic_id.eq(topic_id.into_inner()))
                    .filter(tasks::deleted_at.is_null()),
            )
            .set((
                tasks::deleted_at.eq(Some(deleted_at)),
                tasks::updated_at.eq(deleted_at),
            ))
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            u64::try_from(deleted).map_err(TaskRepositoryError::persistence)
        })
        .await
    }
}

/// Refuses a move to running while another live task on the topic runs.
const IDLE_TOPIC_GUARD: &str = "NOT EXISTS (SELECT 1 FROM tasks AS sibling \
     WHERE sibling.topic_id = tasks.topic_id AND sibling.id <> tasks.id \
     AND sibling.status = 'running' AND sibling.deleted_at IS NULL)";

/// Conditional status write addressed by external task identifier.
struct StatusWrite<'a> {
    external: &'a str,
    accepted: &'a [&'static str],
    status: TaskStatus,
    updated_at: DateTime<Utc>,
}

impl StatusWrite<'_> {
    fn execute(&self, connection: &mut PgConnection) -> TaskRepositoryResult<usize> {
        let guard = if self.status == TaskStatus::Running {
            IDLE_TOPIC_GUARD
        } else {
            "TRUE"
        };
        diesel::update(
            tasks::table
                .filter(tasks::external_task_id.eq(self.external))
                .filter(tasks::deleted_at.is_null())
                .filter(tasks::status.eq_any(self.accepted.to_vec()))
                .filter(sql::<Bool>(guard)),
        )
        .set((
            tasks::status.eq(self.status.as_str()),
            tasks::updated_at.eq(self.updated_at),
        ))
        .execute(connection)
        .or_else(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                let row = find_live_by_external_id(connection, self.external)?;
                Err(row.map_or_else(
                    || TaskRepositoryError::persistence(err),
                    |found| topic_busy(connection, found.topic_id, found.id),
                ))
            }
            other => Err(TaskRepositoryError::persistence(other)),
        })
    }
}

fn running_sibling(
    connection: &mut PgConnection,
    topic_id: Uuid,
    task_id: Uuid,
) -> TaskRepositoryResult<Option<Uuid>> {
    tasks::table
        .filter(tasks::topic_id.eq(topic_id))
        .filter(tasks::id.ne(task_id))
        .filter(tasks::status.eq(TaskStatus::Running.as_str()))
        .filter(tasks::deleted_at.is_null())
        .select(tasks::id)
        .first::<Uuid>(connection)
        .optional()
        .map_err(TaskRepositoryError::persistence)
}

/// Builds the busy error, naming the running sibling when it can be read.
fn topic_busy(connection: &mut PgConnection, topic_id: Uuid, task_id: Uuid) -> TaskRepositoryError {
    match running_sibling(connection, topic_id, task_id) {
        Ok(Some(running)) => TaskRepositoryError::TopicBusy {
            topic_id: TopicId::from_uuid(topic_id),
            running_task_id: TaskId::from_uuid(running),
        },
        Ok(None) => TaskRepositoryError::persistence(std::io::Error::other(format!(
            "running task constraint rejected task {task_id} on topic {topic_id}"
        ))),
        Err(err) => err,
    }
}

fn find_live_by_external_id(
    connection: &mut PgConnection,
    external_task_id: &str,
) -> TaskRepositoryResult<Option<TaskRow>> {
    tasks::table
        .filter(tasks::external_task_id.eq(external_task_id))
        .filter(tasks::deleted_at.is_null())
        .order(tasks::created_at.desc())
        .select(TaskRow::as_select())
        .first::<TaskRow>(connection)
        .optional()
        .map_err(TaskRepositoryError::persistence)
}

fn parse_status(value: &str) -> TaskRepositoryResult<TaskStatus> {
    TaskStatus::try_from(value).map_err(TaskRepositoryError::persistence)
}

fn to_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id().into_inner(),
        external_task_id: task.external_task_id().map(|id| id.as_str().to_owned()),
        user_id: task.user_id().as_str().to_owned(),
        organization_code: task.organization_code().as_str().to_owned(),
        workspace_id: task.workspace_id().into_inner(),
        topic_id: task.topic_id().into_inner(),
        sandbox_id: task.sandbox_id().map(|id| id.as_str().to_owned()),
        task_mode: task.task_mode().as_str().to_owned(),
        prompt: task.prompt().to_owned(),
        attachments: task.attachments().cloned(),
        status: task.status().as_str().to_owned(),
        work_dir: task.work_dir().to_owned(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        deleted_at: task.deleted_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        external_task_id,
        user_id,
        organization_code,
        workspace_id,
        topic_id,
        sandbox_id,
        task_mode,
        prompt,
        attachments,
        status,
        work_dir,
        created_at,
        updated_at,
        deleted_at,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        external_task_id: external_task_id
            .filter(|value| !value.trim().is_empty())
            .map(ExternalTaskId::new)
            .transpose()
            .map_err(TaskRepositoryError::persistence)?,
        user_id: UserId::new(user_id).map_err(TaskRepositoryError::persistence)?,
        organization_code: OrganizationCode::new(organization_code)
            .map_err(TaskRepositoryError::persistence)?,
        workspace_id: WorkspaceId::from_uuid(workspace_id),
        topic_id: TopicId::from_uuid(topic_id),
        sandbox_id: SandboxId::parse_optional(sandbox_id.as_deref())
            .map_err(TaskRepositoryError::persistence)?,
        task_mode: TaskMode::try_from(task_mode.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        prompt,
        attachments,
        status: parse_status(&status)?,
        work_dir,
        created_at,
        updated_at,
        deleted_at,
    };
    Ok(Task::from_persisted(data))
}
