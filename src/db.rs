use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Turns a unique-index violation into `Conflict`, keeps everything else as-is.
    pub(crate) fn from_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Database(err)
    }
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}
