//! Repository layer for database operations
//!
//! Each entity has a repository trait with a PostgreSQL implementation. Services
//! only see the traits, so tests can substitute mocks.

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod languages;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use authors::AuthorsRepository;
pub use book_instances::BookInstancesRepository;
pub use books::BooksRepository;
pub use genres::GenresRepository;
pub use languages::LanguagesRepository;
pub use users::UsersRepository;

/// Main repository struct holding one handle per entity
#[derive(Clone)]
pub struct Repository {
    pub genres: Arc<dyn GenresRepository>,
    pub languages: Arc<dyn LanguagesRepository>,
    pub authors: Arc<dyn AuthorsRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub book_instances: Arc<dyn BookInstancesRepository>,
    pub users: Arc<dyn UsersRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            genres: Arc::new(genres::PgGenresRepository::new(pool.clone())),
            languages: Arc::new(languages::PgLanguagesRepository::new(pool.clone())),
            authors: Arc::new(authors::PgAuthorsRepository::new(pool.clone())),
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            book_instances: Arc::new(book_instances::PgBookInstancesRepository::new(pool.clone())),
            users: Arc::new(users::PgUsersRepository::new(pool)),
        }
    }
}
