//! User repository trait definition.

use captor_types::error::RepositoryError;
use captor_types::user::User;

/// A user row to insert. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Repository trait for user persistence.
///
/// Implementations live in captor-infra (e.g., SqliteUserRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `Conflict` when the email is taken.
    fn create(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn get_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// List users in id order.
    fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> impl std::future::Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Persist name, email and password hash, stamping `updated_at`.
    ///
    /// Fails with `NotFound` for an unknown id and `Conflict` when the new
    /// email belongs to another user.
    fn update(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Delete a user together with every agent it owns and all rows those
    /// agents own, as one atomic unit.
    ///
    /// Fails with `NotFound` for an unknown id, leaving everything in place.
    fn delete(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
