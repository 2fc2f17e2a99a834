//! `PostgreSQL` repository implementation for the task transcript.

use super::{models::TaskMessageRow, schema::task_messages};
use crate::postgres::{PgPool, run_blocking};
use crate::task::{
    domain::{
        MessageRole, MessageType, PersistedTaskMessageData, TaskId, TaskMessage, TaskMessageId,
        TaskStatus,
    },
    ports::{TaskMessageRepository, TaskMessageRepositoryError, TaskMessageRepositoryResult},
};
use crate::topic::domain::TopicId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

/// `PostgreSQL`-backed transcript, ordered by a database sequence.
#[derive(Debug, Clone)]
pub struct PostgresTaskMessageRepository {
    pool: PgPool,
}

impl PostgresTaskMessageRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskMessageRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskMessageRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.pool, TaskMessageRepositoryError::persistence, f).await
    }
}

#[async_trait]
impl TaskMessageRepository for PostgresTaskMessageRepository {
    async fn append(&self, message: &TaskMessage) -> TaskMessageRepositoryResult<()> {
        let row = to_row(message);
        self.run_blocking(move |connection| {
            diesel::insert_into(task_messages::table)
                .values(&row)
                .execute(connection)
                .map_err(TaskMessageRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list_by_task(
        &self,
        task_id: TaskId,
    ) -> TaskMessageRepositoryResult<Vec<TaskMessage>> {
        self.run_blocking(move |connection| {
            let rows = task_messages::table
                .filter(task_messages::task_id.eq(task_id.into_inner()))
                .order(task_messages::seq.asc())
                .select(TaskMessageRow::as_select())
                .load::<TaskMessageRow>(connection)
                .map_err(TaskMessageRepositoryError::persistence)?;
            rows.into_iter().map(row_to_message).collect()
        })
        .await
    }
}

fn to_row(message: &TaskMessage) -> TaskMessageRow {
    TaskMessageRow {
        id: message.id().into_inner(),
        task_id: message.task_id().into_inner(),
        topic_id: message.topic_id().into_inner(),
        sender: message.sender().as_str().to_owned(),
        receiver: message.receiver().as_str().to_owned(),
        message_type: message.message_type().as_str().to_owned(),
        content: message.content().to_owned(),
        status: message.status().map(|status| status.as_str().to_owned()),
        steps: message.steps().cloned(),
        tool: message.tool().cloned(),
        attachments: message.attachments().cloned(),
        event: message.event().map(str::to_owned),
        created_at: message.created_at(),
    }
}

fn row_to_message(row: TaskMessageRow) -> TaskMessageRepositoryResult<TaskMessage> {
    let data = PersistedTaskMessageData {
        id: TaskMessageId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        topic_id: TopicId::from_uuid(row.topic_id),
        sender: MessageRole::try_from(row.sender.as_str())
            .map_err(TaskMessageRepositoryError::persistence)?,
        receiver: MessageRole::try_from(row.receiver.as_str())
            .map_err(TaskMessageRepositoryError::persistence)?,
        message_type: MessageType::try_from(row.message_type.as_str())
            .map_err(TaskMessageRepositoryError::persistence)?,
        content: row.content,
        status: row
            .status
            .as_deref()
            .map(TaskStatus::try_from)
            .transpose()
            .map_err(TaskMessageRepositoryError::persistence)?,
        steps: row.steps,
        tool: row.tool,
        attachments: row.attachments,
        event: row.event,
        created_at: row.created_at,
    };
    Ok(TaskMessage::from_persisted(data))
}
