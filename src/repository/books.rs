//! Books repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{Book, NewBook},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// One page of books with their author's name, plus the total count
    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Book>, i64)>;

    async fn get(&self, id: i32) -> AppResult<Book>;

    async fn exists(&self, id: i32) -> AppResult<bool>;

    /// Books attributed to an author, by title
    async fn by_author(&self, author_id: i32) -> AppResult<Vec<Book>>;

    async fn count(&self) -> AppResult<i64>;

    /// Inserts a book and its genre links
    async fn create(&self, book: &NewBook) -> AppResult<Book>;

    /// Rewrites a book and replaces its genre links
    async fn update(&self, id: i32, book: &NewBook) -> AppResult<Book>;

    /// Deletes a book after detaching its copies and genre links
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const SELECT_BOOKS: &str = r#"
    SELECT b.*,
           CASE WHEN a.id IS NULL THEN NULL
                ELSE a.last_name || ', ' || a.first_name END AS author_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", id))
}

async fn link_genres(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i32,
    genre_ids: &[i32],
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO book_genres (book_id, genre_id)
        SELECT $1, UNNEST($2::INTEGER[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(book_id)
    .bind(genre_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Book>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        let query = format!("{} ORDER BY b.id LIMIT $1 OFFSET $2", SELECT_BOOKS);
        let books = sqlx::query_as::<_, Book>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    async fn get(&self, id: i32) -> AppResult<Book> {
        let query = format!("{} WHERE b.id = $1", SELECT_BOOKS);
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn by_author(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let query = format!("{} WHERE b.author_id = $1 ORDER BY b.title, b.id", SELECT_BOOKS);
        let books = sqlx::query_as::<_, Book>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, summary, isbn, author_id, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.author_id)
        .bind(book.language_id)
        .fetch_one(&mut *tx)
        .await?;

        link_genres(&mut tx, id, &book.genre_ids).await?;
        tx.commit().await?;

        self.get(id).await
    }

    async fn update(&self, id: i32, book: &NewBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, summary = $3, isbn = $4, author_id = $5, language_id = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.author_id)
        .bind(book.language_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if updated == 0 {
            return Err(not_found(id));
        }

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_genres(&mut tx, id, &book.genre_ids).await?;
        tx.commit().await?;

        self.get(id).await
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let detached = sqlx::query("UPDATE book_instances SET book_id = NULL WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(not_found(id));
        }

        tx.commit().await?;
        tracing::debug!("Detached {} copies from deleted book {}", detached, id);
        Ok(())
    }
}
