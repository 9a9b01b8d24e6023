//! Home page

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, services::catalog::CatalogCounts, AppState};

use super::AuthenticatedUser;

/// Catalog counts and how often this session has seen the home page
#[derive(Serialize, ToSchema)]
pub struct IndexResponse {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    /// Visits to this page earlier in the session
    pub num_visits: i64,
}

/// Home page
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Catalog counts", body = IndexResponse),
        (status = 303, description = "Login required")
    )
)]
pub async fn index(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<IndexResponse>> {
    let counts = state.services.catalog.counts().await?;
    let num_visits = state.services.sessions.record_visit(claims.sid).await?;
    Ok(Json(IndexResponse { counts, num_visits }))
}
