//! Login endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{error::AppResult, AppState};

/// Query string of the login page
#[derive(Debug, Deserialize, IntoParams)]
pub struct LoginQuery {
    /// Page to return to once logged in
    pub next: Option<String>,
}

/// What the login page tells the client
#[derive(Serialize, ToSchema)]
pub struct LoginPrompt {
    pub message: String,
    pub next: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub next: Option<String>,
}

/// Login page, where requests without credentials are redirected
#[utoipa::path(
    get,
    path = "/accounts/login/",
    tag = "auth",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login prompt", body = LoginPrompt)
    )
)]
pub async fn login_prompt(Query(query): Query<LoginQuery>) -> Json<LoginPrompt> {
    let message = if query.next.is_some() {
        "Please login to see this page."
    } else {
        "Please login."
    };
    Json(LoginPrompt {
        message: message.to_string(),
        next: query.next,
    })
}

/// Log in and receive a bearer token opening a new session
#[utoipa::path(
    post,
    path = "/accounts/login/",
    tag = "auth",
    params(LoginQuery),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid login or password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let token = state
        .services
        .users
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.services.users.token_lifetime(),
        next: query.next,
    }))
}
