//! Signup, login, and current-user handlers.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json};

use captor_types::user::{AccessToken, CreateUserRequest, LoginRequest, User};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/auth/signup - Register a new user.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let user = state.user_service.signup(body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let self_link = format!("/api/users/{}", user.id);
    let resp = ApiResponse::success(user, request_id, elapsed).with_link("self", &self_link);

    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /api/auth/login - Form-encoded login (`email`, `password`).
pub async fn login(
    State(state): State<AppState>,
    Form(body): Form<LoginRequest>,
) -> Result<Json<ApiResponse<AccessToken>>, AppError> {
    issue_token(&state, &body).await
}

/// POST /api/auth/login-json - JSON login.
pub async fn login_json(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AccessToken>>, AppError> {
    issue_token(&state, &body).await
}

async fn issue_token(
    state: &AppState,
    body: &LoginRequest,
) -> Result<Json<ApiResponse<AccessToken>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let token = state.auth_service.login(body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(token, request_id, elapsed)))
}

/// GET /api/auth/me - The authenticated user.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<User>> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let self_link = format!("/api/users/{}", user.id);
    let elapsed = start.elapsed().as_millis() as u64;
    Json(ApiResponse::success(user, request_id, elapsed).with_link("self", &self_link))
}
