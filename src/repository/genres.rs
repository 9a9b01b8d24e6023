//! Genres repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::Genre};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenresRepository: Send + Sync {
    /// All genres, by name
    async fn list(&self) -> AppResult<Vec<Genre>>;

    async fn count(&self) -> AppResult<i64>;

    /// Genres linked to a book, by name
    async fn for_book(&self, book_id: i32) -> AppResult<Vec<Genre>>;

    /// Number of distinct ids in `ids` that name an existing genre
    async fn count_existing(&self, ids: &[i32]) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgGenresRepository {
    pool: Pool<Postgres>,
}

impl PgGenresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenresRepository for PgGenresRepository {
    async fn list(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn for_book(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.id
            WHERE bg.book_id = $1
            ORDER BY g.name, g.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn count_existing(&self, ids: &[i32]) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM genres WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
