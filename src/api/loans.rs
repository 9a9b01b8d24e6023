//! Loan views: borrowed copies, renewals, lending and returns

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use axum_extra::extract::Form;
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    forms::{BookInstanceForm, LendForm, RenewBookForm, RENEWAL_HELP_TEXT},
    models::{BookInstance, BookInstanceDetails, Page, PageQuery},
    AppState,
};

use super::AuthenticatedUser;

/// Renewal form for one copy
#[derive(Serialize, ToSchema)]
pub struct RenewalView {
    pub book_instance: BookInstanceDetails,
    /// Initial value of the renewal date field
    pub renewal_date: NaiveDate,
    pub help_text: String,
}

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/mybooks/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Borrowed copies, soonest due first", body = crate::models::BookInstancePage),
        (status = 303, description = "Login required"),
        (status = 404, description = "No such page")
    )
)]
pub async fn my_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookInstanceDetails>>> {
    let loans = state.services.loans.borrowed_by_user(claims.user_id, &query).await?;
    Ok(Json(loans))
}

/// Every copy on loan
#[utoipa::path(
    get,
    path = "/allbooks/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Copies on loan, soonest due first", body = crate::models::BookInstancePage),
        (status = 303, description = "Login required"),
        (status = 404, description = "No such page")
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookInstanceDetails>>> {
    let loans = state.services.loans.all_borrowed(&query).await?;
    Ok(Json(loans))
}

#[utoipa::path(
    get,
    path = "/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Renewal form", body = RenewalView),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalView>> {
    claims.require_renew_loans()?;

    let (book_instance, renewal_date) = state.services.loans.renewal_form(id).await?;
    Ok(Json(RenewalView {
        book_instance,
        renewal_date,
        help_text: RENEWAL_HELP_TEXT.to_string(),
    }))
}

/// Renew a loan
#[utoipa::path(
    post,
    path = "/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body(content = RenewBookForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Renewed, redirects to all borrowed books"),
        (status = 400, description = "Invalid renewal date", body = crate::error::ErrorResponse),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Form(form): Form<RenewBookForm>,
) -> AppResult<Redirect> {
    claims.require_renew_loans()?;

    state.services.loans.renew(id, &form).await?;
    Ok(Redirect::to("/allbooks/"))
}

/// Register a new copy of a book
#[utoipa::path(
    post,
    path = "/bookinstance/create/",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body(content = BookInstanceForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Copy created", body = BookInstance),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Form(form): Form<BookInstanceForm>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    claims.require_renew_loans()?;

    let instance = state.services.loans.create_instance(&form).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Lend an available copy
#[utoipa::path(
    post,
    path = "/bookinstance/{id}/lend/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body(content = LendForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Copy on loan", body = BookInstance),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Copy is not available")
    )
)]
pub async fn lend(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Form(form): Form<LendForm>,
) -> AppResult<Json<BookInstance>> {
    claims.require_renew_loans()?;

    let instance = state.services.loans.lend(id, &form).await?;
    Ok(Json(instance))
}

/// Mark a copy on loan as returned
#[utoipa::path(
    post,
    path = "/bookinstance/{id}/return/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Copy available again", body = BookInstance),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Copy is not on loan")
    )
)]
pub async fn mark_returned(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    claims.require_renew_loans()?;

    let instance = state.services.loans.mark_returned(id).await?;
    Ok(Json(instance))
}
