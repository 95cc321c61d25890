//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use captor_types::error::{AgentError, AuthError, ChatError, UserError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Agent lifecycle errors.
    Agent(AgentError),
    /// Session and conversation errors.
    Chat(ChatError),
    /// User account errors.
    User(UserError),
    /// Login and token errors.
    Auth(AuthError),
    /// Caller may not act on another user's resource.
    Forbidden(String),
    /// Authentication failure.
    Unauthorized(String),
}

impl From<AgentError> for AppError {
    fn from(e: AgentError) -> Self {
        AppError::Agent(e)
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl AppError {
    /// Status code, machine-readable code, and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Agent(AgentError::NotFound) => {
                (StatusCode::NOT_FOUND, "AGENT_NOT_FOUND", "Agent not found".to_string())
            }
            AppError::Agent(AgentError::Forbidden) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", "Not authorized to access this agent".to_string())
            }
            AppError::Agent(e @ AgentError::ChatUrlConflict(_)) => {
                (StatusCode::CONFLICT, "CHAT_URL_CONFLICT", e.to_string())
            }
            AppError::Agent(AgentError::InvalidSchemaType(msg) | AgentError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Agent(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR", e.to_string())
            }
            AppError::Chat(ChatError::AgentNotFound) => {
                (StatusCode::NOT_FOUND, "AGENT_NOT_FOUND", "Agent not found".to_string())
            }
            AppError::Chat(ChatError::SessionNotFound) => {
                (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", "Chat session not found".to_string())
            }
            AppError::Chat(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CHAT_ERROR", e.to_string())
            }
            AppError::User(UserError::NotFound) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found".to_string())
            }
            AppError::User(e @ UserError::EmailConflict(_)) => {
                (StatusCode::CONFLICT, "EMAIL_CONFLICT", e.to_string())
            }
            AppError::User(UserError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::User(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "USER_ERROR", e.to_string())
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", "Incorrect email or password".to_string())
            }
            AppError::Auth(AuthError::InvalidToken | AuthError::TokenExpired) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Could not validate credentials".to_string())
            }
            AppError::Auth(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_ERROR", e.to_string())
            }
            AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(code, error = %message, "Request failed");
        }

        let envelope =
            ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string(), 0);
        let body = serde_json::to_string(&envelope).unwrap_or_else(|_| {
            r#"{"data":null,"errors":[{"code":"SERIALIZATION_ERROR","message":"Failed to serialize response"}]}"#.to_string()
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_errors_map_to_404() {
        for err in [
            AppError::from(AgentError::NotFound),
            AppError::from(ChatError::AgentNotFound),
            AppError::from(ChatError::SessionNotFound),
            AppError::from(UserError::NotFound),
        ] {
            assert_eq!(err.parts().0, StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn test_conflicts_map_to_409() {
        let (status, code, message) =
            AppError::from(AgentError::ChatUrlConflict("support".to_string())).parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "CHAT_URL_CONFLICT");
        assert!(message.contains("support"));

        let (status, code, _) =
            AppError::from(UserError::EmailConflict("ada@example.com".to_string())).parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "EMAIL_CONFLICT");
    }

    #[test]
    fn test_forbidden_and_auth_statuses() {
        assert_eq!(AppError::from(AgentError::Forbidden).parts().0, StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).parts().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::TokenExpired).parts().0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_validation_and_storage_statuses() {
        let (status, _, message) =
            AppError::from(AgentError::InvalidSchemaType("invalid schema type: 'form'".to_string()))
                .parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("form"));

        assert_eq!(
            AppError::from(ChatError::StorageError("disk full".to_string())).parts().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_body() {
        let response = AppError::from(AgentError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
    }
}
