//! Author views

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
    forms::AuthorForm,
    models::{Author, AuthorDetail, Page, PageQuery},
    AppState,
};

use super::AuthenticatedUser;

/// Author create/update form
#[derive(Serialize, ToSchema)]
pub struct AuthorFormView {
    /// The author being edited, absent on create
    pub author: Option<Author>,
}

/// List authors
#[utoipa::path(
    get,
    path = "/authors/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = crate::models::AuthorPage),
        (status = 404, description = "No such page")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Author>>> {
    let authors = state.services.catalog.list_authors(&query).await?;
    Ok(Json(authors))
}

/// Get author details and books
#[utoipa::path(
    get,
    path = "/author/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author with their books", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

#[utoipa::path(
    get,
    path = "/author/create/",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Empty author form", body = AuthorFormView),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn create_author_form(
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<AuthorFormView>> {
    claims.require_write_authors()?;
    Ok(Json(AuthorFormView { author: None }))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/author/create/",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body(content = AuthorForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created, redirects to the author"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Form(form): Form<AuthorForm>,
) -> AppResult<Redirect> {
    claims.require_write_authors()?;

    let author = state.services.catalog.create_author(&form).await?;
    Ok(Redirect::to(&author.url()))
}

#[utoipa::path(
    get,
    path = "/author/{id}/update",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author form with current values", body = AuthorFormView),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorFormView>> {
    claims.require_write_authors()?;

    let author = state.services.catalog.get_author_record(id).await?;
    Ok(Json(AuthorFormView { author: Some(author) }))
}

/// Update an author
#[utoipa::path(
    post,
    path = "/author/{id}/update",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body(content = AuthorForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated, redirects to the author"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Form(form): Form<AuthorForm>,
) -> AppResult<Redirect> {
    claims.require_write_authors()?;

    let author = state.services.catalog.update_author(id, &form).await?;
    Ok(Redirect::to(&author.url()))
}

#[utoipa::path(
    get,
    path = "/author/{id}/delete",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author to confirm deletion of, with their books", body = AuthorDetail),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    claims.require_write_authors()?;

    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Delete an author. Their books are kept without an author.
#[utoipa::path(
    post,
    path = "/author/{id}/delete",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 303, description = "Deleted, redirects to the author list"),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    claims.require_write_authors()?;

    state.services.catalog.delete_author(id).await?;
    Ok(Redirect::to("/authors/"))
}
