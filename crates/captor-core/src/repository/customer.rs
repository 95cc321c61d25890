//! Customer repository trait definition.

use captor_types::customer::Customer;
use captor_types::error::RepositoryError;

/// Repository trait for customers scoped to an agent.
pub trait CustomerRepository: Send + Sync {
    /// Insert a customer with name and email exactly as supplied.
    fn create(
        &self,
        agent_id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Customer, RepositoryError>> + Send;

    /// First customer of `agent_id` whose email equals `email` exactly.
    fn find_by_email(
        &self,
        agent_id: i64,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<Customer>, RepositoryError>> + Send;
}
