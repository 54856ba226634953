use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::StoreError;
use crate::movies::repo_types::{Movie, MovieFields, Page, PageRequest};

#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn create(&self, owner: Uuid, fields: MovieFields) -> Result<Movie, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Movie>, StoreError>;
    async fn list(&self, page: PageRequest) -> Result<Page<Movie>, StoreError>;
    /// Case-insensitive literal substring match on title.
    async fn search_by_title(
        &self,
        title: &str,
        page: PageRequest,
    ) -> Result<Page<Movie>, StoreError>;
    async fn list_by_owner(&self, owner: Uuid, page: PageRequest)
        -> Result<Page<Movie>, StoreError>;
    /// Replaces the mutable fields; `None` if the movie no longer exists.
    async fn update(&self, id: Uuid, fields: MovieFields) -> Result<Option<Movie>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const MOVIE_COLUMNS: &str =
    "id, title, description, poster, trailer, actors, genres, user_id, created_at";

/// `%` and `_` are literal in titles, so they are escaped before wrapping.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[derive(Clone)]
pub struct PgMovieStore {
    db: PgPool,
}

impl PgMovieStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn create(&self, owner: Uuid, f: MovieFields) -> Result<Movie, StoreError> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            r#"
            INSERT INTO movies (title, description, poster, trailer, actors, genres, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MOVIE_COLUMNS}
            "#
        ))
        .bind(&f.title)
        .bind(&f.description)
        .bind(&f.poster)
        .bind(&f.trailer)
        .bind(&f.actors)
        .bind(&f.genres)
        .bind(owner)
        .fetch_one(&self.db)
        .await?;
        Ok(movie)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(movie)
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Movie>, StoreError> {
        let items = sqlx::query_as::<_, Movie>(&format!(
            r#"
            SELECT {MOVIE_COLUMNS}
            FROM movies
            ORDER BY created_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.db)
            .await?;
        Ok(Page { items, total })
    }

    async fn search_by_title(
        &self,
        title: &str,
        page: PageRequest,
    ) -> Result<Page<Movie>, StoreError> {
        let pattern = like_pattern(title);
        let items = sqlx::query_as::<_, Movie>(&format!(
            r#"
            SELECT {MOVIE_COLUMNS}
            FROM movies
            WHERE title ILIKE $1 ESCAPE '\'
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&pattern)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let total: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM movies WHERE title ILIKE $1 ESCAPE '\'"#)
                .bind(&pattern)
                .fetch_one(&self.db)
                .await?;
        Ok(Page { items, total })
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        page: PageRequest,
    ) -> Result<Page<Movie>, StoreError> {
        let items = sqlx::query_as::<_, Movie>(&format!(
            r#"
            SELECT {MOVIE_COLUMNS}
            FROM movies
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies WHERE user_id = $1")
            .bind(owner)
            .fetch_one(&self.db)
            .await?;
        Ok(Page { items, total })
    }

    async fn update(&self, id: Uuid, f: MovieFields) -> Result<Option<Movie>, StoreError> {
        // The owner column is never written here.
        let movie = sqlx::query_as::<_, Movie>(&format!(
            r#"
            UPDATE movies
            SET title = $2, description = $3, poster = $4, trailer = $5,
                actors = $6, genres = $7
            WHERE id = $1
            RETURNING {MOVIE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&f.title)
        .bind(&f.description)
        .bind(&f.poster)
        .bind(&f.trailer)
        .bind(&f.actors)
        .bind(&f.genres)
        .fetch_optional(&self.db)
        .await?;
        Ok(movie)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
