//! Book instances (copies) repository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{BookInstance, LoanStatus, NewBookInstance},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInstancesRepository: Send + Sync {
    /// One page of copies on loan, ascending by due-back date, plus the total count.
    ///
    /// With a `borrower_id` only that user's loans are returned.
    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<BookInstance>, i64)>;

    async fn get(&self, id: Uuid) -> AppResult<BookInstance>;

    /// Copies of a book, ascending by due-back date
    async fn for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>>;

    async fn count(&self) -> AppResult<i64>;

    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64>;

    async fn create(&self, id: Uuid, instance: &NewBookInstance) -> AppResult<BookInstance>;

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()>;

    /// Puts an available copy on loan. Returns false if the copy was not available.
    async fn lend(&self, id: Uuid, borrower_id: i32, due_back: NaiveDate) -> AppResult<bool>;

    /// Makes a copy on loan available again. Returns false if it was not on loan.
    async fn mark_returned(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgBookInstancesRepository {
    pool: Pool<Postgres>,
}

impl PgBookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const SELECT_INSTANCES: &str = r#"
    SELECT bi.*, b.title AS book_title
    FROM book_instances bi
    LEFT JOIN books b ON b.id = bi.book_id
"#;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Book instance {} not found", id))
}

#[async_trait]
impl BookInstancesRepository for PgBookInstancesRepository {
    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<BookInstance>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_instances
            WHERE status = $1 AND ($2::INTEGER IS NULL OR borrower_id = $2)
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            r#"{}
            WHERE bi.status = $1 AND ($2::INTEGER IS NULL OR bi.borrower_id = $2)
            ORDER BY bi.due_back, bi.id
            LIMIT $3 OFFSET $4
            "#,
            SELECT_INSTANCES
        );
        let instances = sqlx::query_as::<_, BookInstance>(&query)
            .bind(LoanStatus::OnLoan)
            .bind(borrower_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((instances, total))
    }

    async fn get(&self, id: Uuid) -> AppResult<BookInstance> {
        let query = format!("{} WHERE bi.id = $1", SELECT_INSTANCES);
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let query = format!("{} WHERE bi.book_id = $1 ORDER BY bi.due_back, bi.id", SELECT_INSTANCES);
        let instances = sqlx::query_as::<_, BookInstance>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(instances)
    }

    async fn count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, id: Uuid, instance: &NewBookInstance) -> AppResult<BookInstance> {
        sqlx::query("INSERT INTO book_instances (id, book_id, imprint, status) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(instance.book_id)
            .bind(&instance.imprint)
            .bind(instance.status)
            .execute(&self.pool)
            .await?;
        self.get(id).await
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let updated = sqlx::query("UPDATE book_instances SET due_back = $2 WHERE id = $1")
            .bind(id)
            .bind(due_back)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn lend(&self, id: Uuid, borrower_id: i32, due_back: NaiveDate) -> AppResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE book_instances
            SET status = $2, borrower_id = $3, due_back = $4
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(id)
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .bind(due_back)
        .bind(LoanStatus::Available)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated > 0)
    }

    async fn mark_returned(&self, id: Uuid) -> AppResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE book_instances
            SET status = $2, borrower_id = NULL, due_back = NULL
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(id)
        .bind(LoanStatus::Available)
        .bind(LoanStatus::OnLoan)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated > 0)
    }
}
