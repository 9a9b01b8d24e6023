//! HTTP handlers for the catalog and loan views

pub mod auth;
pub mod authors;
pub mod books;
pub mod health;
pub mod index;
pub mod loans;
pub mod openapi;


use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for the logged-in user, from the JWT bearer token.
///
/// Requests without credentials are sent to the login page; a token that
/// does not verify is rejected outright.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        let next = parts
                            .uri
                            .path_and_query()
                            .map(|path| path.as_str())
                            .unwrap_or_else(|| parts.uri.path());
                        AppError::LoginRequired(next.to_string())
                    } else {
                        AppError::Authentication("Invalid authorization header format".to_string())
                    }
                })?;

        let claims = state.services.users.verify_token(bearer.token())?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let views = Router::new()
        .route("/", get(index::index))
        // Catalog
        .route("/books/", get(books::list_books))
        .route("/book/:id", get(books::get_book))
        .route("/book/create/", get(books::create_book_form).post(books::create_book))
        .route("/book/:id/update", get(books::update_book_form).post(books::update_book))
        .route("/book/:id/delete", get(books::delete_book_form).post(books::delete_book))
        .route("/authors/", get(authors::list_authors))
        .route("/author/:id", get(authors::get_author))
        .route("/author/create/", get(authors::create_author_form).post(authors::create_author))
        .route("/author/:id/update", get(authors::update_author_form).post(authors::update_author))
        .route("/author/:id/delete", get(authors::delete_author_form).post(authors::delete_author))
        // Loans
        .route("/mybooks/", get(loans::my_borrowed))
        .route("/allbooks/", get(loans::all_borrowed))
        .route("/book/:id/renew/", get(loans::renew_form).post(loans::renew))
        .route("/bookinstance/create/", post(loans::create_instance))
        .route("/bookinstance/:id/lend/", post(loans::lend))
        .route("/bookinstance/:id/return/", post(loans::mark_returned))
        // Accounts
        .route("/accounts/login/", get(auth::login_prompt).post(auth::login))
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .with_state(state);

    Router::new()
        .merge(views)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
