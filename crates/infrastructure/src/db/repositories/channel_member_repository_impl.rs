//! 频道成员仓储的 PostgreSQL 实现。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, FromRow, PgPool};
use uuid::Uuid;

use application::repository::ChannelMemberRepository;
use domain::{ChannelId, ChannelMember, RepositoryError, UserId};

use crate::db::map_sqlx_error;

#[derive(Debug, FromRow)]
struct ChannelMemberRow {
    channel_id: Uuid,
    user_id: Uuid,
    joined_at: DateTime<Utc>,
}

impl From<ChannelMemberRow> for ChannelMember {
    fn from(row: ChannelMemberRow) -> Self {
        ChannelMember {
            channel_id: ChannelId::from(row.channel_id),
            user_id: UserId::from(row.user_id),
            joined_at: row.joined_at,
        }
    }
}

pub struct PgChannelMemberRepository {
    pool: PgPool,
}

impl PgChannelMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelMemberRepository for PgChannelMemberRepository {
    async fn upsert(&self, member: ChannelMember) -> Result<ChannelMember, RepositoryError> {
        query(
            "INSERT INTO channel_members (channel_id, user_id, joined_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (channel_id, user_id) DO NOTHING",
        )
        .bind(Uuid::from(member.channel_id))
        .bind(Uuid::from(member.user_id))
        .bind(member.joined_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(member)
    }

    async fn remove(&self, channel_id: ChannelId, user_id: UserId) -> Result<(), RepositoryError> {
        query("DELETE FROM channel_members WHERE channel_id = $1 AND user_id = $2")
            .bind(Uuid::from(channel_id))
            .bind(Uuid::from(user_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<Option<ChannelMember>, RepositoryError> {
        let row = query_as::<_, ChannelMemberRow>(
            "SELECT channel_id, user_id, joined_at
             FROM channel_members WHERE channel_id = $1 AND user_id = $2",
        )
        .bind(Uuid::from(channel_id))
        .bind(Uuid::from(user_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ChannelMember::from))
    }

    async fn list_members(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<ChannelMember>, RepositoryError> {
        let rows = query_as::<_, ChannelMemberRow>(
            "SELECT channel_id, user_id, joined_at
             FROM channel_members WHERE channel_id = $1 ORDER BY joined_at",
        )
        .bind(Uuid::from(channel_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ChannelMember::from).collect())
    }
}
