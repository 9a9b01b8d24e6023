//! Languages repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::Language};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguagesRepository: Send + Sync {
    /// All languages, by name
    async fn list(&self) -> AppResult<Vec<Language>>;

    async fn get(&self, id: i32) -> AppResult<Option<Language>>;
}

#[derive(Clone)]
pub struct PgLanguagesRepository {
    pool: Pool<Postgres>,
}

impl PgLanguagesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LanguagesRepository for PgLanguagesRepository {
    async fn list(&self) -> AppResult<Vec<Language>> {
        let languages =
            sqlx::query_as::<_, Language>("SELECT id, name FROM languages ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(languages)
    }

    async fn get(&self, id: i32) -> AppResult<Option<Language>> {
        let language = sqlx::query_as::<_, Language>("SELECT id, name FROM languages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(language)
    }
}
