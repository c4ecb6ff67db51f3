//! # Sales DB
//!
//! PostgreSQL access for the Sales API.
//!
//! Query construction stays with the caller; this crate only runs statements
//! and normalises their failures into [`DbError`], so that "no such row" is
//! always distinguishable from every other database failure. Every helper can
//! be bounded by a request deadline through [`with_deadline`].
//!
//! # Example
//!
//! ```ignore
//! use sales_db::{connect, query_one, with_deadline};
//!
//! let pool = connect(&config.db)?;
//! let q = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = $1").bind(id);
//! let row = with_deadline(deadline, query_one(&pool, q)).await?;
//! ```

use std::future::Future;

use sales_config::DatabaseConfig;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{Execute, FromRow, Postgres};
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found")]
    NotFound,
    #[error("duplicate key: {0}")]
    Duplicate(String),
    #[error("deadline exceeded")]
    Timeout,
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl DbError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Duplicate(db.constraint().unwrap_or_default().to_string())
            }
            other => Self::Sqlx(other),
        }
    }
}

/// Builds a lazily connecting pool; the first query opens the first connection.
pub fn connect(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let mut options = PgPoolOptions::new();
    if config.max_open_conns > 0 {
        options = options.max_connections(config.max_open_conns);
    }
    Ok(options.connect_lazy(&config.url)?)
}

/// Returns an error if the database cannot answer a trivial query.
pub async fn status_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Runs a statement that returns no rows, yielding the affected row count.
pub async fn execute<'q>(
    pool: &PgPool,
    query: Query<'q, Postgres, PgArguments>,
) -> Result<u64, DbError> {
    debug!(query = %squash(query.sql()), "database.execute");
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// Fetches exactly one row, [`DbError::NotFound`] when there is none.
pub async fn query_one<'q, O>(
    pool: &PgPool,
    query: QueryAs<'q, Postgres, O, PgArguments>,
) -> Result<O, DbError>
where
    O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
{
    debug!(query = %squash(query.sql()), "database.query_one");
    query.fetch_optional(pool).await?.ok_or(DbError::NotFound)
}

/// Fetches every matching row. An empty result is not an error.
pub async fn query_many<'q, O>(
    pool: &PgPool,
    query: QueryAs<'q, Postgres, O, PgArguments>,
) -> Result<Vec<O>, DbError>
where
    O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
{
    debug!(query = %squash(query.sql()), "database.query_many");
    Ok(query.fetch_all(pool).await?)
}

/// Abandons `fut` once `deadline` passes.
pub async fn with_deadline<T, F>(deadline: Instant, fut: F) -> Result<T, DbError>
where
    F: Future<Output = Result<T, DbError>>,
{
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(DbError::Timeout),
    }
}

/// Collapses whitespace so multi-line statements log on one line.
fn squash(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
