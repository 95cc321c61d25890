//! Agent repository trait definition.

use captor_types::agent::{Agent, AgentDetail, NewAgent, NewDataField, SchemaType};
use captor_types::error::RepositoryError;

/// Repository trait for agent persistence.
///
/// Implementations live in captor-infra (e.g., SqliteAgentRepository).
pub trait AgentRepository: Send + Sync {
    /// Create an agent, its data schema, and the schema's fields as one unit.
    ///
    /// Fields are inserted in slice order. The returned detail carries no
    /// chat sessions.
    fn create(
        &self,
        agent: &NewAgent,
        schema_type: SchemaType,
        fields: &[NewDataField],
    ) -> impl std::future::Future<Output = Result<AgentDetail, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    fn get_by_chat_url(
        &self,
        chat_url: &str,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    /// List a user's agents, newest first.
    fn list_by_user(
        &self,
        user_id: i64,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<Agent>, RepositoryError>> + Send;

    fn count_by_user(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Count agents across all users.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Persist every mutable attribute (including `chat_url`), stamping
    /// `updated_at`.
    ///
    /// Fails with `Conflict` when `chat_url` is held by another agent.
    fn update(
        &self,
        agent: &Agent,
    ) -> impl std::future::Future<Output = Result<Agent, RepositoryError>> + Send;

    /// Delete an agent and everything hanging off it, children first, in one
    /// transaction. Fails with `NotFound` for an unknown id.
    fn delete_cascade(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
