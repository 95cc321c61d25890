use thiserror::Error;

/// Errors related to agent lifecycle operations.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent not found")]
    NotFound,

    #[error("agent is owned by another user")]
    Forbidden,

    #[error("chat URL '{0}' is already in use")]
    ChatUrlConflict(String),

    #[error("{0}")]
    InvalidSchemaType(String),

    #[error("invalid agent: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to chat sessions and conversation appends.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("agent not found")]
    AgentNotFound,

    #[error("session not found")]
    SessionNotFound,

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to user accounts.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("email '{0}' is already registered")]
    EmailConflict(String),

    #[error("invalid user: {0}")]
    Validation(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from credential checks and bearer tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from repository operations (used by trait definitions in captor-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
