//! Catalog management service

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    forms::{self, AuthorForm, BookForm},
    models::{
        genre::display_genre, Author, AuthorDetail, Book, BookDetail, BookFormChoices,
        BookInstanceDetails, LoanStatus, NewBook, Page, PageQuery, PageRequest,
    },
    repository::Repository,
};

pub const BOOKS_PER_PAGE: i64 = 10;
pub const AUTHORS_PER_PAGE: i64 = 10;

/// Record counts shown on the home page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Cheapest query that proves the database answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.genres.count().await.map(|_| ())
    }

    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.book_instances.count().await?,
            num_instances_available: self
                .repository
                .book_instances
                .count_by_status(LoanStatus::Available)
                .await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.genres.count().await?,
        })
    }

    pub async fn list_books(&self, query: &PageQuery) -> AppResult<Page<Book>> {
        let request = PageRequest::new(query, BOOKS_PER_PAGE)?;
        let (books, total) = self.repository.books.list(request.offset(), request.limit()).await?;
        Page::new(books, total, request)
    }

    /// Get a book with its author, language, genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.repository.books.get(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get(author_id).await?),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => self.repository.languages.get(language_id).await?,
            None => None,
        };
        let genres = self.repository.genres.for_book(id).await?;

        let today = self.clock.today();
        let copies = self
            .repository
            .book_instances
            .for_book(id)
            .await?
            .into_iter()
            .map(|instance| BookInstanceDetails::new(instance, today))
            .collect();

        Ok(BookDetail {
            display_genre: display_genre(&genres),
            book,
            author,
            language,
            genres,
            copies,
        })
    }

    pub async fn list_authors(&self, query: &PageQuery) -> AppResult<Page<Author>> {
        let request = PageRequest::new(query, AUTHORS_PER_PAGE)?;
        let (authors, total) =
            self.repository.authors.list(request.offset(), request.limit()).await?;
        Page::new(authors, total, request)
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get(id).await?;
        let books = self.repository.books.by_author(id).await?;
        Ok(AuthorDetail {
            display_name: author.to_string(),
            author,
            books,
        })
    }

    pub async fn get_author_record(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get(id).await
    }

    pub async fn create_author(&self, form: &AuthorForm) -> AppResult<Author> {
        let author = form.clean()?;
        let created = self.repository.authors.create(&author).await?;
        tracing::info!("Created author {} ({})", created.id, created);
        Ok(created)
    }

    pub async fn update_author(&self, id: i32, form: &AuthorForm) -> AppResult<Author> {
        self.repository.authors.get(id).await?;
        let author = form.clean()?;
        let updated = self.repository.authors.update(id, &author).await?;
        tracing::info!("Updated author {}", id);
        Ok(updated)
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Deleted author {}", id);
        Ok(())
    }

    /// Authors, genres and languages a book may refer to
    pub async fn book_form_choices(&self) -> AppResult<BookFormChoices> {
        Ok(BookFormChoices {
            authors: self.repository.authors.list_all().await?,
            genres: self.repository.genres.list().await?,
            languages: self.repository.languages.list().await?,
        })
    }

    pub async fn create_book(&self, form: &BookForm) -> AppResult<Book> {
        let book = form.clean()?;
        self.check_book_references(&book).await?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!("Created book {} ({})", created.id, created.title);
        Ok(created)
    }

    pub async fn update_book(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        self.repository.books.get(id).await?;
        let book = form.clean()?;
        self.check_book_references(&book).await?;
        let updated = self.repository.books.update(id, &book).await?;
        tracing::info!("Updated book {}", id);
        Ok(updated)
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    /// Rejects choices that do not name an existing author, language or genre
    async fn check_book_references(&self, book: &NewBook) -> AppResult<()> {
        let mut errors = ValidationErrors::new();

        if let Some(author_id) = book.author_id {
            if !self.repository.authors.exists(author_id).await? {
                errors.add("author", forms::invalid_choice());
            }
        }
        if let Some(language_id) = book.language_id {
            if self.repository.languages.get(language_id).await?.is_none() {
                errors.add("language", forms::invalid_choice());
            }
        }
        let known = self.repository.genres.count_existing(&book.genre_ids).await?;
        if known != book.genre_ids.len() as i64 {
            errors.add("genre", forms::invalid_choice());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Form(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testutils::SettableClock;
    use crate::models::{BookInstance, Genre, Language};
    use crate::repository::testutils::MockRepositories;
    use chrono::NaiveDate;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn service(repos: MockRepositories) -> CatalogService {
        CatalogService::new(repos.into_repository(), Arc::new(SettableClock::at_date(today())))
    }

    fn book(id: i32) -> Book {
        Book {
            id,
            title: "Solaris".to_string(),
            summary: "A sentient ocean.".to_string(),
            isbn: "9780156027601".to_string(),
            author_id: Some(2),
            language_id: Some(1),
            author_name: Some("Lem, Stanislaw".to_string()),
        }
    }

    fn author(id: i32) -> Author {
        Author {
            id,
            first_name: "Stanislaw".to_string(),
            last_name: "Lem".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1921, 9, 12),
            date_of_death: NaiveDate::from_ymd_opt(2006, 3, 27),
        }
    }

    fn book_form() -> BookForm {
        BookForm {
            title: "Solaris".to_string(),
            author: Some("2".to_string()),
            summary: "A sentient ocean.".to_string(),
            isbn: "9780156027601".to_string(),
            genre: vec!["1".to_string(), "2".to_string()],
            language: Some("1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_counts() {
        let mut repos = MockRepositories::new();
        repos.books.expect_count().returning(|| Ok(4));
        repos.book_instances.expect_count().returning(|| Ok(9));
        repos
            .book_instances
            .expect_count_by_status()
            .with(eq(LoanStatus::Available))
            .returning(|_| Ok(5));
        repos.authors.expect_count().returning(|| Ok(3));
        repos.genres.expect_count().returning(|| Ok(6));

        let counts = service(repos).counts().await.unwrap();
        assert_eq!(
            CatalogCounts {
                num_books: 4,
                num_instances: 9,
                num_instances_available: 5,
                num_authors: 3,
                num_genres: 6,
            },
            counts
        );
    }

    #[tokio::test]
    async fn test_list_books_second_page() {
        let mut repos = MockRepositories::new();
        repos
            .books
            .expect_list()
            .with(eq(10), eq(10))
            .returning(|_, _| Ok((vec![book(11)], 11)));

        let page = service(repos).list_books(&PageQuery { page: Some(2) }).await.unwrap();
        assert_eq!(2, page.num_pages);
        assert_eq!(vec![book(11)], page.items);
    }

    #[tokio::test]
    async fn test_get_book_resolves_relations() {
        let mut repos = MockRepositories::new();
        repos.books.expect_get().with(eq(1)).returning(|id| Ok(book(id)));
        repos.authors.expect_get().with(eq(2)).returning(|id| Ok(author(id)));
        repos
            .languages
            .expect_get()
            .with(eq(1))
            .returning(|id| Ok(Some(Language { id, name: "Polish".to_string() })));
        repos.genres.expect_for_book().with(eq(1)).returning(|_| {
            Ok(vec![Genre { id: 2, name: "Science Fiction".to_string() }])
        });
        repos.book_instances.expect_for_book().with(eq(1)).returning(|_| {
            Ok(vec![BookInstance {
                id: Uuid::new_v4(),
                book_id: Some(1),
                imprint: "Harcourt, 2002".to_string(),
                due_back: NaiveDate::from_ymd_opt(2024, 5, 30),
                status: Some(LoanStatus::OnLoan),
                borrower_id: Some(8),
                book_title: Some("Solaris".to_string()),
            }])
        });

        let detail = service(repos).get_book(1).await.unwrap();
        assert_eq!("Science Fiction", detail.display_genre);
        assert_eq!(Some(author(2)), detail.author);
        assert_eq!(1, detail.copies.len());
        assert!(detail.copies[0].is_overdue);
    }

    #[tokio::test]
    async fn test_get_book_not_found() {
        let mut repos = MockRepositories::new();
        repos
            .books
            .expect_get()
            .returning(|id| Err(AppError::NotFound(format!("Book with id {} not found", id))));

        let result = service(repos).get_book(99).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_author_invalid_form_is_not_stored() {
        let mut repos = MockRepositories::new();
        repos.authors.expect_create().never();

        let form = AuthorForm { first_name: String::new(), ..AuthorForm::default() };
        let result = service(repos).create_author(&form).await;
        assert!(matches!(result, Err(AppError::Form(_))));
    }

    #[tokio::test]
    async fn test_update_unknown_author_is_not_found_before_validation() {
        let mut repos = MockRepositories::new();
        repos
            .authors
            .expect_get()
            .returning(|_| Err(AppError::NotFound("Author with id 5 not found".to_string())));
        repos.authors.expect_update().never();

        let result = service(repos).update_author(5, &AuthorForm::default()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_book_checks_references() {
        let mut repos = MockRepositories::new();
        repos.authors.expect_exists().with(eq(2)).returning(|_| Ok(false));
        repos.languages.expect_get().with(eq(1)).returning(|_| Ok(None));
        repos
            .genres
            .expect_count_existing()
            .withf(|ids| ids.to_vec() == vec![1, 2])
            .returning(|_| Ok(1));
        repos.books.expect_create().never();

        let result = service(repos).create_book(&book_form()).await;
        match result {
            Err(AppError::Form(errors)) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("author"));
                assert!(fields.contains_key("language"));
                assert!(fields.contains_key("genre"));
            }
            other => panic!("Unexpected result {:?}", other.map(|b| b.id)),
        }
    }

    #[tokio::test]
    async fn test_create_book() {
        let mut repos = MockRepositories::new();
        repos.authors.expect_exists().returning(|_| Ok(true));
        repos
            .languages
            .expect_get()
            .returning(|id| Ok(Some(Language { id, name: "Polish".to_string() })));
        repos.genres.expect_count_existing().returning(|ids| Ok(ids.len() as i64));
        repos
            .books
            .expect_create()
            .withf(|book: &NewBook| book.genre_ids == vec![1, 2] && book.author_id == Some(2))
            .times(1)
            .returning(|_| Ok(book(21)));

        let created = service(repos).create_book(&book_form()).await.unwrap();
        assert_eq!("/book/21", created.url());
    }
}
