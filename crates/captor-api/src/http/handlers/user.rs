//! User account handlers.
//!
//! Any authenticated user may read accounts; an account can only be
//! modified or deleted by its owner.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;

use captor_types::page::Page;
use captor_types::user::{UpdateUserRequest, User};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::query::PageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/users - List users with pagination.
pub async fn list_users(
    State(state): State<AppState>,
    _auth: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<User>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let page = state.user_service.list_users(query.into()).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(page, request_id, elapsed).with_link("self", "/api/users"),
    ))
}

/// GET /api/users/{id} - Get a user by id.
pub async fn get_user(
    State(state): State<AppState>,
    _auth: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let user = state.user_service.get_user(id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(user, request_id, elapsed)
            .with_link("self", &format!("/api/users/{id}")),
    ))
}

/// PUT /api/users/{id} - Partially update the caller's own account.
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    ensure_self(&caller, id)?;
    let user = state.user_service.update_user(id, body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(user, request_id, elapsed)
            .with_link("self", &format!("/api/users/{id}")),
    ))
}

/// DELETE /api/users/{id} - Delete the caller's own account and every agent it owns.
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    ensure_self(&caller, id)?;
    state.user_service.delete_user(id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": true, "id": id }),
        request_id,
        elapsed,
    )))
}

fn ensure_self(caller: &User, id: i64) -> Result<(), AppError> {
    if caller.id != id {
        return Err(AppError::Forbidden(
            "Not authorized to modify another user's account".to_string(),
        ));
    }
    Ok(())
}
