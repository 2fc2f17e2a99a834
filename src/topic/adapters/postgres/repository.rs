//! `PostgreSQL` repository implementation for topic storage.

use super::{models::TopicRow, schema::topics};
use crate::isolation::{OrganizationCode, UserId};
use crate::postgres::{PgPool, run_blocking};
use crate::sandbox::domain::SandboxId;
use crate::task::domain::{TaskId, TaskMode, TaskStatus};
use crate::topic::{
    domain::{ChatBinding, ChatTopicId, PersistedTopicData, Topic, TopicId, TopicName},
    ports::{TopicRepository, TopicRepositoryError, TopicRepositoryResult},
};
use crate::workspace::domain::WorkspaceId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed topic repository.
#[derive(Debug, Clone)]
pub struct PostgresTopicRepository {
    pool: PgPool,
}

impl PostgresTopicRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TopicRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TopicRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.pool, TopicRepositoryError::persistence, f).await
    }
}

#[async_trait]
impl TopicRepository for PostgresTopicRepository {
    async fn store(&self, topic: &Topic) -> TopicRepositoryResult<()> {
        let topic_id = topic.id();
        let chat_topic_id = topic.chat().topic_id().clone();
        let row = to_row(topic);
        self.run_blocking(move |connection| {
            diesel::insert_into(topics::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_chat_topic_unique_violation(info.as_ref()) =>
                    {
                        TopicRepositoryError::DuplicateChatTopic(chat_topic_id.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TopicRepositoryError::DuplicateTopic(topic_id)
                    }
                    _ => TopicRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, topic: &Topic) -> TopicRepositoryResult<()> {
        let topic_id = topic.id();
        let row = to_row(topic);
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                topics::table
                    .filter(topics::id.eq(topic_id.into_inner()))
                    .filter(topics::deleted_at.is_null()),
            )
            .set(&row)
            .execute(connection)
            .map_err(TopicRepositoryError::persistence)?;
            if updated == 0 {
                return Err(TopicRepositoryError::NotFound(topic_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TopicId) -> TopicRepositoryResult<Option<Topic>> {
        self.run_blocking(move |connection| {
            let row = topics::table
                .filter(topics::id.eq(id.into_inner()))
                .filter(topics::deleted_at.is_null())
                .select(TopicRow::as_select())
                .first::<TopicRow>(connection)
                .optional()
                .map_err(TopicRepositoryError::persistence)?;
            row.map(row_to_topic).transpose()
        })
        .await
    }

    async fn find_by_chat_topic_id(
        &self,
        user_id: &UserId,
        chat_topic_id: &ChatTopicId,
    ) -> TopicRepositoryResult<Option<Topic>> {
        let user = user_id.as_str().to_owned();
        let chat_topic = chat_topic_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = topics::table
                .filter(topics::user_id.eq(&user))
                .filter(topics::chat_topic_id.eq(&chat_topic))
                .filter(topics::deleted_at.is_null())
                .select(TopicRow::as_select())
                .first::<TopicRow>(connection)
                .optional()
                .map_err(TopicRepositoryError::persistence)?;
            row.map(row_to_topic).transpose()
        })
        .await
    }

    async fn list_by_workspace(
        &self,
        workspace_id: WorkspaceId,
    ) -> TopicRepositoryResult<Vec<Topic>> {
        self.run_blocking(move |connection| {
            let rows = topics::table
                .filter(topics::workspace_id.eq(workspace_id.into_inner()))
                .filter(topics::deleted_at.is_null())
                .order(topics::created_at.asc())
                .select(TopicRow::as_select())
                .load::<TopicRow>(connection)
                .map_err(TopicRepositoryError::persistence)?;
            rows.into_iter().map(row_to_topic).collect()
        })
        .await
    }

    async fn soft_delete(
        &self,
        id: TopicId,
        deleted_at: DateTime<Utc>,
    ) -> TopicRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::update(
                topics::table
                    .filter(topics::id.eq(id.into_inner()))
                    .filter(topics::deleted_at.is_null()),
            )
            .set((
                topics::deleted_at.eq(Some(deleted_at)),
                topics::updated_at.eq(deleted_at),
            ))
            .execute(connection)
            .map_err(TopicRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn soft_delete_by_workspace(
        &self,
        workspace_id: WorkspaceId,
        deleted_at: DateTime<Utc>,
    ) -> TopicRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let deleted = diesel::update(
                topics::table
                    .filter(topics::workspace_id.eq(workspace_id.into_inner()))
                    .filter(topics::deleted_at.is_null()),
            )
            .set((
                topics::deleted_at.eq(Some(deleted_at)),
                topics::updated_at.eq(deleted_at),
            ))
            .execute(connection)
            .map_err(TopicRepositoryError::persistence)?;
            u64::try_from(deleted).map_err(TopicRepositoryError::persistence)
        })
        .await
    }
}

fn is_chat_topic_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == "idx_topics_chat_topic_unique")
}

fn to_row(topic: &Topic) -> TopicRow {
    TopicRow {
        id: topic.id().into_inner(),
        workspace_id: topic.workspace_id().into_inner(),
        user_id: topic.user_id().as_str().to_owned(),
        organization_code: topic.organization_code().as_str().to_owned(),
        chat_conversation_id: topic.chat().conversation_id().as_str().to_owned(),
        chat_topic_id: topic.chat().topic_id().as_str().to_owned(),
        name: topic.name().as_str().to_owned(),
        sandbox_id: topic.sandbox_id().map(|id| id.as_str().to_owned()),
        work_dir: topic.work_dir().to_owned(),
        current_task_id: topic.current_task_id().map(TaskId::into_inner),
        current_task_status: topic
            .current_task_status()
            .map(|status| status.as_str().to_owned()),
        task_mode: topic.task_mode().as_str().to_owned(),
        sandbox_config: topic.sandbox_config().cloned(),
        created_at: topic.created_at(),
        updated_at: topic.updated_at(),
        deleted_at: topic.deleted_at(),
    }
}

fn row_to_topic(row: TopicRow) -> TopicRepositoryResult<Topic> {
    let TopicRow {
        id,
        workspace_id,
        user_id,
        organization_code,
        chat_conversation_id,
        chat_topic_id,
        name,
        sandbox_id,
        work_dir,
        current_task_id,
        current_task_status,
        task_mode,
        sandbox_config,
        created_at,
        updated_at,
        deleted_at,
    } = row;

    let data = PersistedTopicData {
        id: TopicId::from_uuid(id),
        workspace_id: WorkspaceId::from_uuid(workspace_id),
        user_id: UserId::new(user_id).map_err(TopicRepositoryError::persistence)?,
        organization_code: OrganizationCode::new(organization_code)
            .map_err(TopicRepositoryError::persistence)?,
        chat: ChatBinding::from_parts(chat_conversation_id, chat_topic_id)
            .map_err(TopicRepositoryError::persistence)?,
        name: TopicName::new(name).map_err(TopicRepositoryError::persistence)?,
        sandbox_id: SandboxId::parse_optional(sandbox_id.as_deref())
            .map_err(TopicRepositoryError::persistence)?,
        work_dir,
        current_task_id: current_task_id.map(TaskId::from_uuid),
        current_task_status: current_task_status
            .as_deref()
            .map(TaskStatus::try_from)
            .transpose()
            .map_err(TopicRepositoryError::persistence)?,
        task_mode: TaskMode::try_from(task_mode.as_str())
            .map_err(TopicRepositoryError::persistence)?,
        sandbox_config,
        created_at,
        updated_at,
        deleted_at,
    };
    Ok(Topic::from_persisted(data))
}
