//! 用户仓储的 PostgreSQL 实现。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query_as, FromRow, PgPool};
use uuid::Uuid;

use application::repository::UserRepository;
use domain::{
    value_objects::PasswordHash, RepositoryError, User, UserEmail, UserId, Username,
};

use crate::db::map_sqlx_error;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    avatar_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::from(row.id),
            username: Username::parse(row.username)
                .map_err(|e| RepositoryError::storage(e.to_string()))?,
            email: UserEmail::parse(row.email)
                .map_err(|e| RepositoryError::storage(e.to_string()))?,
            password: PasswordHash::new(row.password_hash)
                .map_err(|e| RepositoryError::storage(e.to_string()))?,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, avatar_url, created_at, updated_at";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let row = query_as::<_, UserRow>(
            "INSERT INTO users (id, username, email, password_hash, avatar_url, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, username, email, password_hash, avatar_url, created_at, updated_at",
        )
        .bind(Uuid::from(user.id))
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .bind(&user.avatar_url)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError> {
        let row = query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_ids(&self, ids: Vec<UserId>) -> Result<Vec<User>, RepositoryError> {
        let ids: Vec<Uuid> = ids.into_iter().map(Uuid::from).collect();
        let rows = query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(User::try_from).collect()
    }
}
