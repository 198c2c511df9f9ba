//! 频道仓储的 PostgreSQL 实现。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query_as, FromRow, PgPool};
use uuid::Uuid;

use application::repository::ChannelRepository;
use domain::{Channel, ChannelId, ChannelVisibility, RepositoryError, UserId};

use crate::db::map_sqlx_error;

#[derive(Debug, FromRow)]
struct ChannelRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    visibility: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ChannelRow> for Channel {
    fn from(row: ChannelRow) -> Self {
        let visibility = match row.visibility.as_str() {
            "private" => ChannelVisibility::Private,
            _ => ChannelVisibility::Public,
        };
        Channel {
            id: ChannelId::from(row.id),
            name: row.name,
            description: row.description,
            visibility,
            created_by: UserId::from(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn visibility_column(visibility: ChannelVisibility) -> &'static str {
    match visibility {
        ChannelVisibility::Public => "public",
        ChannelVisibility::Private => "private",
    }
}

pub struct PgChannelRepository {
    pool: PgPool,
}

impl PgChannelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CHANNEL_COLUMNS: &str = "id, name, description, visibility, created_by, created_at, updated_at";

#[async_trait]
impl ChannelRepository for PgChannelRepository {
    async fn create(&self, channel: Channel) -> Result<Channel, RepositoryError> {
        let row = query_as::<_, ChannelRow>(
            "INSERT INTO channels (id, name, description, visibility, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, name, description, visibility, created_by, created_at, updated_at",
        )
        .bind(Uuid::from(channel.id))
        .bind(&channel.name)
        .bind(&channel.description)
        .bind(visibility_column(channel.visibility))
        .bind(Uuid::from(channel.created_by))
        .bind(channel.created_at)
        .bind(channel.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: ChannelId) -> Result<Option<Channel>, RepositoryError> {
        let row = query_as::<_, ChannelRow>(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Channel::from))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Channel>, RepositoryError> {
        let row = query_as::<_, ChannelRow>(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Channel::from))
    }

    async fn list_visible_to(&self, user_id: UserId) -> Result<Vec<Channel>, RepositoryError> {
        // 公开频道 + 自己是成员的私有频道，最近活跃的排前面
        let rows = query_as::<_, ChannelRow>(
            "SELECT c.id, c.name, c.description, c.visibility, c.created_by, c.created_at, c.updated_at
             FROM channels c
             LEFT JOIN channel_members m ON m.channel_id = c.id AND m.user_id = $1
             WHERE c.visibility = 'public' OR m.user_id IS NOT NULL
             ORDER BY c.updated_at DESC",
        )
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Channel::from).collect())
    }
}
