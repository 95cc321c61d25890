//! Agent lifecycle handlers for the REST API.
//!
//! Every route except lookup by chat URL is authenticated and scoped to
//! agents the caller owns.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use captor_types::agent::{AgentDetail, ChatUrlRequest, CreateAgentRequest, UpdateAgentRequest};
use captor_types::page::Page;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::query::PageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/agents - List the caller's agents, newest first.
pub async fn list_agents(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<AgentDetail>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let page = state.agent_service.list_agents(user.id, query.into()).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(page, request_id, elapsed).with_link("self", "/api/agents"),
    ))
}

/// POST /api/agents - Create an agent with its data schema and fields.
pub async fn create_agent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateAgentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AgentDetail>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let agent = state.agent_service.create_agent(user.id, body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let self_link = format!("/api/agents/{}", agent.agent.id);
    let resp = ApiResponse::success(agent, request_id, elapsed).with_link("self", &self_link);

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/agents/{id} - Get one of the caller's agents.
pub async fn get_agent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AgentDetail>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let agent = state.agent_service.get_owned_agent(id, user.id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(agent_response(agent, request_id, elapsed)))
}

/// GET /api/agents/by-chat-url/{chat_url} - Public lookup used by the chat widget.
pub async fn get_agent_by_chat_url(
    State(state): State<AppState>,
    Path(chat_url): Path<String>,
) -> Result<Json<ApiResponse<AgentDetail>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let agent = state.agent_service.get_by_chat_url(&chat_url).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(agent, request_id, elapsed)))
}

/// PUT /api/agents/{id} - Partially update an agent, its schema type, and fields.
pub async fn update_agent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateAgentRequest>,
) -> Result<Json<ApiResponse<AgentDetail>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    state.agent_service.ensure_owner(id, user.id).await?;
    let agent = state.agent_service.update_agent(id, body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(agent_response(agent, request_id, elapsed)))
}

/// DELETE /api/agents/{id} - Delete an agent and everything beneath it.
pub async fn delete_agent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    state.agent_service.ensure_owner(id, user.id).await?;
    state.agent_service.delete_agent(id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": true, "id": id }),
        request_id,
        elapsed,
    )))
}

/// PUT /api/agents/{id}/chat-url - Claim a public chat URL.
pub async fn set_chat_url(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<ChatUrlRequest>,
) -> Result<Json<ApiResponse<AgentDetail>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let agent = state
        .agent_service
        .set_chat_url(id, &body.chat_url, user.id)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(agent_response(agent, request_id, elapsed)))
}

/// DELETE /api/agents/{id}/chat-url - Release the agent's chat URL.
pub async fn clear_chat_url(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AgentDetail>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let agent = state.agent_service.clear_chat_url(id, user.id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(agent_response(agent, request_id, elapsed)))
}

fn agent_response(agent: AgentDetail, request_id: String, elapsed: u64) -> ApiResponse<AgentDetail> {
    let self_link = format!("/api/agents/{}", agent.agent.id);
    let chat_link = agent
        .agent
        .chat_url
        .as_ref()
        .map(|url| format!("/api/agents/by-chat-url/{url}"));

    let mut resp = ApiResponse::success(agent, request_id, elapsed).with_link("self", &self_link);
    if let Some(chat_link) = chat_link {
        resp = resp.with_link("chat", &chat_link);
    }
    resp
}
