//! Chat widget and conversation history handlers.
//!
//! The widget routes are public: a customer reaches an agent through its
//! chat URL without an account. Listing conversations requires the agent
//! owner's token.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use captor_types::chat::{
    AppendAssistantMessageRequest, AppendAssistantMessageWithDataRequest, AppendMessageRequest,
    AppendUserMessageRequest, AssistantAppendResult, ConversationSummary, Message,
    ResolveSessionRequest, ResolvedSession, SessionDetail,
};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Body of a plain message append.
#[derive(Debug, Serialize)]
pub struct AppendedMessage {
    pub message: Message,
}

/// POST /api/chat/get-or-create-session - Resolve the customer and session.
pub async fn get_or_create_session(
    State(state): State<AppState>,
    Json(body): Json<ResolveSessionRequest>,
) -> Result<Json<ApiResponse<ResolvedSession>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let resolved = state.session_resolver.resolve(&body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let session_link = format!("/api/chat/sessions/{}", resolved.session.id);
    Ok(Json(
        ApiResponse::success(resolved, request_id, elapsed).with_link("session", &session_link),
    ))
}

/// POST /api/chat/append-first-message - Append with caller-supplied roles.
pub async fn append_first_message(
    State(state): State<AppState>,
    Json(body): Json<AppendMessageRequest>,
) -> Result<Json<ApiResponse<AppendedMessage>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let message = state.conversation_service.append_message(&body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        AppendedMessage { message },
        request_id,
        elapsed,
    )))
}

/// POST /api/chat/append-user-message - Append a customer message.
pub async fn append_user_message(
    State(state): State<AppState>,
    Json(body): Json<AppendUserMessageRequest>,
) -> Result<Json<ApiResponse<AppendedMessage>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let message = state.conversation_service.append_user_message(&body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        AppendedMessage { message },
        request_id,
        elapsed,
    )))
}

/// POST /api/chat/append-assistant-message - Append an agent message.
pub async fn append_assistant_message(
    State(state): State<AppState>,
    Json(body): Json<AppendAssistantMessageRequest>,
) -> Result<Json<ApiResponse<AssistantAppendResult>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let result = state
        .conversation_service
        .append_assistant_message(&body)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(result, request_id, elapsed)))
}

/// POST /api/chat/append-assistant-message-with-data - Append an agent
/// message with extracted answers.
pub async fn append_assistant_message_with_data(
    State(state): State<AppState>,
    Json(body): Json<AppendAssistantMessageWithDataRequest>,
) -> Result<Json<ApiResponse<AssistantAppendResult>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let result = state
        .conversation_service
        .append_assistant_message_with_data(&body)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(result, request_id, elapsed)))
}

/// GET /api/chat/conversations - Every session across the caller's agents.
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<ConversationSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let conversations = state
        .conversation_service
        .list_conversations(user.id)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(conversations, request_id, elapsed)
            .with_link("self", "/api/chat/conversations"),
    ))
}

/// GET /api/chat/sessions/{id} - A session with its full history.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SessionDetail>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let detail = state.conversation_service.get_session_detail(id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(detail, request_id, elapsed)
            .with_link("self", &format!("/api/chat/sessions/{id}")),
    ))
}
