//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, health, index, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library API",
        version = "1.0.0",
        description = "Catalog and loans of a small lending library"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login_prompt,
        auth::login,
        // Catalog
        index::index,
        books::list_books,
        books::get_book,
        books::create_book_form,
        books::create_book,
        books::update_book_form,
        books::update_book,
        books::delete_book_form,
        books::delete_book,
        authors::list_authors,
        authors::get_author,
        authors::create_author_form,
        authors::create_author,
        authors::update_author_form,
        authors::update_author,
        authors::delete_author_form,
        authors::delete_author,
        // Loans
        loans::my_borrowed,
        loans::all_borrowed,
        loans::renew_form,
        loans::renew,
        loans::create_instance,
        loans::lend,
        loans::mark_returned,
    ),
    components(
        schemas(
            // Auth
            auth::LoginPrompt,
            auth::LoginRequest,
            auth::LoginResponse,
            // Catalog
            index::IndexResponse,
            crate::services::catalog::CatalogCounts,
            crate::models::Genre,
            crate::models::Language,
            crate::models::Author,
            crate::models::AuthorDetail,
            crate::models::AuthorPage,
            crate::models::Book,
            crate::models::BookDetail,
            crate::models::BookPage,
            crate::models::BookFormChoices,
            crate::forms::AuthorForm,
            crate::forms::BookForm,
            books::BookFormView,
            authors::AuthorFormView,
            // Loans
            crate::models::LoanStatus,
            crate::models::BookInstance,
            crate::models::BookInstanceDetails,
            crate::models::BookInstancePage,
            crate::forms::RenewBookForm,
            crate::forms::BookInstanceForm,
            crate::forms::LendForm,
            loans::RenewalView,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Books and authors"),
        (name = "loans", description = "Copies on loan, renewals and returns")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
