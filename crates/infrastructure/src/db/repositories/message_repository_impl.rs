//! 消息仓储的 PostgreSQL 实现。
//!
//! 每条消息立即持久化；软删除是对 is_deleted 与 content 的
//! 原地更新，记录永不删除。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query_as, FromRow, PgPool};
use uuid::Uuid;

use application::repository::MessageRepository;
use domain::{ChannelId, Message, MessageContent, MessageId, RepositoryError, UserId};

use crate::db::map_sqlx_error;

#[derive(Debug, FromRow)]
struct MessageRow {
    id: Uuid,
    channel_id: Uuid,
    sender_id: Uuid,
    content: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            id: MessageId::from(row.id),
            channel_id: ChannelId::from(row.channel_id),
            sender_id: UserId::from(row.sender_id),
            content: MessageContent::new(row.content)
                .map_err(|e| RepositoryError::storage(e.to_string()))?,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MESSAGE_COLUMNS: &str = "id, channel_id, sender_id, content, is_deleted, created_at, updated_at";

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        let row = query_as::<_, MessageRow>(
            "INSERT INTO messages (id, channel_id, sender_id, content, is_deleted, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, channel_id, sender_id, content, is_deleted, created_at, updated_at",
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.channel_id))
        .bind(Uuid::from(message.sender_id))
        .bind(message.content.as_str())
        .bind(message.is_deleted)
        .bind(message.created_at)
        .bind(message.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn update(&self, message: Message) -> Result<Message, RepositoryError> {
        let row = query_as::<_, MessageRow>(
            "UPDATE messages
             SET content = $2, is_deleted = $3, updated_at = $4
             WHERE id = $1
             RETURNING id, channel_id, sender_id, content, is_deleted, created_at, updated_at",
        )
        .bind(Uuid::from(message.id))
        .bind(message.content.as_str())
        .bind(message.is_deleted)
        .bind(message.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let row = query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Message::try_from).transpose()
    }

    async fn list_by_channel(
        &self,
        channel_id: ChannelId,
        filter: Option<String>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = match filter {
            Some(filter) => {
                query_as::<_, MessageRow>(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE channel_id = $1 AND content ILIKE $2
                     ORDER BY created_at, id"
                ))
                .bind(Uuid::from(channel_id))
                .bind(format!("%{filter}%"))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                query_as::<_, MessageRow>(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE channel_id = $1
                     ORDER BY created_at, id"
                ))
                .bind(Uuid::from(channel_id))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(Message::try_from).collect()
    }
}
