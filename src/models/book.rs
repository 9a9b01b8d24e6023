//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::author::Author;
use super::book_instance::BookInstanceDetails;
use super::genre::{Genre, Language};

/// A catalog entry. Physical copies are [`super::BookInstance`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    /// 13 character ISBN
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    // Computed fields (populated when queried with JOINs, None otherwise)
    #[sqlx(default)]
    #[serde(default)]
    pub author_name: Option<String>,
}

impl Book {
    /// Canonical page of this book
    pub fn url(&self) -> String {
        format!("/book/{}", self.id)
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Book with its relations resolved, as shown on the book page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub author: Option<Author>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    pub display_genre: String,
    pub copies: Vec<BookInstanceDetails>,
}

/// Cleaned book fields ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    pub genre_ids: Vec<i32>,
}

/// Selectable values for the book form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookFormChoices {
    pub authors: Vec<Author>,
    pub genres: Vec<Genre>,
    pub languages: Vec<Language>,
}
