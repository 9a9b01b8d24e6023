//! Book views

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::Form;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    forms::BookForm,
    models::{Book, BookDetail, BookFormChoices, Page, PageQuery},
    AppState,
};

use super::AuthenticatedUser;

/// Book create/update form: current values and the allowed choices
#[derive(Serialize, ToSchema)]
pub struct BookFormView {
    /// The book being edited, absent on create
    pub book: Option<BookDetail>,
    pub choices: BookFormChoices,
}

/// List books
#[utoipa::path(
    get,
    path = "/books/",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = crate::models::BookPage),
        (status = 303, description = "Login required"),
        (status = 404, description = "No such page")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Book>>> {
    let books = state.services.catalog.list_books(&query).await?;
    Ok(Json(books))
}

/// Get book details
#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book with genres, language and copies", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

#[utoipa::path(
    get,
    path = "/book/create/",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Empty book form", body = BookFormView),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn create_book_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<BookFormView>> {
    claims.require_write_books()?;

    let choices = state.services.catalog.book_form_choices().await?;
    Ok(Json(BookFormView { book: None, choices }))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/book/create/",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body(content = BookForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created, redirects to the book"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Form(form): Form<BookForm>,
) -> AppResult<Redirect> {
    claims.require_write_books()?;

    let book = state.services.catalog.create_book(&form).await?;
    Ok(Redirect::to(&book.url()))
}

#[utoipa::path(
    get,
    path = "/book/{id}/update",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book form with current values", body = BookFormView),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookFormView>> {
    claims.require_write_books()?;

    let book = state.services.catalog.get_book(id).await?;
    let choices = state.services.catalog.book_form_choices().await?;
    Ok(Json(BookFormView { book: Some(book), choices }))
}

/// Update a book and its genres
#[utoipa::path(
    post,
    path = "/book/{id}/update",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body(content = BookForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated, redirects to the book"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Form(form): Form<BookForm>,
) -> AppResult<Redirect> {
    claims.require_write_books()?;

    let book = state.services.catalog.update_book(id, &form).await?;
    Ok(Redirect::to(&book.url()))
}

#[utoipa::path(
    get,
    path = "/book/{id}/delete",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book to confirm deletion of", body = BookDetail),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    claims.require_write_books()?;

    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Delete a book. Its copies are kept without a book.
#[utoipa::path(
    post,
    path = "/book/{id}/delete",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 303, description = "Deleted, redirects to the book list"),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    claims.require_write_books()?;

    state.services.catalog.delete_book(id).await?;
    Ok(Redirect::to("/books/"))
}
