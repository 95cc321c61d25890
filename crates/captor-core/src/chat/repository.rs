//! ChatRepository trait definition.
//!
//! Provides persistence for chat sessions, messages, and collected data.
//! Follows the same RPITIT pattern as AgentRepository.

use captor_types::chat::{ChatSession, CollectedData, Message};
use captor_types::error::RepositoryError;

/// A message to append to a session.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub session_id: i64,
    pub sender: String,
    pub receiver: String,
    pub content: String,
}

/// Repository trait for chat session, message, and collected-data persistence.
///
/// Implementations live in captor-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Open a new session for an agent with the given customer snapshot.
    fn create_session(
        &self,
        agent_id: i64,
        customer_name: Option<&str>,
        customer_email: Option<&str>,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    fn get_session(
        &self,
        session_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Most recently created session of `agent_id` whose snapshot equals the
    /// given name and email. `None` only matches a missing value.
    fn find_latest_session(
        &self,
        agent_id: i64,
        customer_name: Option<&str>,
        customer_email: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// List sessions for an agent, newest first.
    fn list_sessions(
        &self,
        agent_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Mark a session closed.
    ///
    /// `ended_at` is stamped only on the first close; `updated_at` is
    /// refreshed every time. Fails with `NotFound` for an unknown session.
    fn close_session(
        &self,
        session_id: i64,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    fn save_message(
        &self,
        message: &NewMessage,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Get messages for a session, ordered by created_at ASC.
    fn get_messages(
        &self,
        session_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    fn save_collected_data(
        &self,
        session_id: i64,
        field_id: i64,
        answer: &str,
    ) -> impl std::future::Future<Output = Result<CollectedData, RepositoryError>> + Send;

    /// Get collected answers for a session, ordered by created_at ASC.
    fn get_collected_data(
        &self,
        session_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<CollectedData>, RepositoryError>> + Send;

    /// Count total sessions across all agents.
    fn count_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Count total messages across all sessions.
    fn count_messages(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
