//! Users repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{AccountTypeRightsRow, AccountTypeSlug, NewUser, User, UserRights},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn get_by_login(&self, login: &str) -> AppResult<Option<User>>;

    async fn exists(&self, id: i32) -> AppResult<bool>;

    /// Rights granted by an account type
    async fn get_rights(&self, account_type: &AccountTypeSlug) -> AppResult<UserRights>;

    async fn create(&self, user: &NewUser) -> AppResult<User>;
}

#[derive(Clone)]
pub struct PgUsersRepository {
    pool: Pool<Postgres>,
}

impl PgUsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn get_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn get_rights(&self, account_type: &AccountTypeSlug) -> AppResult<UserRights> {
        let row = sqlx::query_as::<_, AccountTypeRightsRow>(
            "SELECT loans_rights, authors_rights, books_rights FROM account_types WHERE slug = $1",
        )
        .bind(account_type)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Unknown account type {}", account_type)))?;
        Ok(row.into())
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login, password, first_name, last_name, account_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.login)
        .bind(&user.password)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.account_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }
}
