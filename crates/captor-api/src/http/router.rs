//! Axum router configuration with middleware.
//!
//! All routes are under `/api/`.
//! Middleware: CORS, tracing.

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Auth
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/login-json", post(handlers::auth::login_json))
        .route("/auth/me", get(handlers::auth::me))
        // Users
        .route("/users", get(handlers::user::list_users))
        .route(
            "/users/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        // Agents
        .route(
            "/agents",
            get(handlers::agent::list_agents).post(handlers::agent::create_agent),
        )
        .route("/agents/create-agent", post(handlers::agent::create_agent))
        .route(
            "/agents/by-chat-url/{chat_url}",
            get(handlers::agent::get_agent_by_chat_url),
        )
        .route(
            "/agents/{id}",
            get(handlers::agent::get_agent)
                .put(handlers::agent::update_agent)
                .delete(handlers::agent::delete_agent),
        )
        .route(
            "/agents/{id}/chat-url",
            put(handlers::agent::set_chat_url).delete(handlers::agent::clear_chat_url),
        )
        // Chat widget
        .route(
            "/chat/get-or-create-session",
            post(handlers::chat::get_or_create_session),
        )
        .route(
            "/chat/append-first-message",
            post(handlers::chat::append_first_message),
        )
        .route(
            "/chat/append-user-message",
            post(handlers::chat::append_user_message),
        )
        .route(
            "/chat/append-assistant-message",
            post(handlers::chat::append_assistant_message),
        )
        .route(
            "/chat/append-assistant-message-with-data",
            post(handlers::chat::append_assistant_message_with_data),
        )
        // Conversation history
        .route("/chat/conversations", get(handlers::chat::list_conversations))
        .route("/chat/sessions/{id}", get(handlers::chat::get_session));

    Router::new()
        .nest("/api", api_routes)
        .route("/", get(root))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - Service banner.
async fn root(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "message": format!("{} API", state.app_name),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
