//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod pagination;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorDetail, NewAuthor};
pub use book::{Book, BookDetail, BookFormChoices, NewBook};
pub use book_instance::{BookInstance, BookInstanceDetails, LoanStatus, NewBookInstance};
pub use genre::{Genre, Language};
pub use pagination::{AuthorPage, BookInstancePage, BookPage, Page, PageQuery, PageRequest};
pub use user::{User, UserClaims, UserRights};
