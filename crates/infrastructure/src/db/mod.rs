pub mod repositories;

use domain::RepositoryError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn create_pg_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// sqlx 错误到仓储错误的统一映射。
pub(crate) fn map_sqlx_error(error: sqlx::Error) -> RepositoryError {
    match &error {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            RepositoryError::Conflict
        }
        _ => RepositoryError::storage(error.to_string()),
    }
}
