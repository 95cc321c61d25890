//! User account service.
//!
//! Signup, profile updates, and account deletion. Deleting a user removes
//! every agent it owns in the same storage transaction as the user row.

use captor_types::error::{AuthError, RepositoryError, UserError};
use captor_types::page::{Page, PageRequest};
use captor_types::user::{CreateUserRequest, MIN_PASSWORD_LEN, UpdateUserRequest, User};
use tracing::info;

use crate::repository::user::{NewUser, UserRepository};
use crate::service::auth::PasswordHasher;

/// Service owning the user account lifecycle.
pub struct UserService<U: UserRepository, P: PasswordHasher> {
    user_repo: U,
    hasher: P,
}

impl<U: UserRepository, P: PasswordHasher> UserService<U, P> {
    pub fn new(user_repo: U, hasher: P) -> Self {
        Self { user_repo, hasher }
    }

    /// Register a new account.
    pub async fn signup(&self, request: CreateUserRequest) -> Result<User, UserError> {
        let name = validate_name(&request.name)?;
        let email = validate_email(&request.email)?;
        validate_password(&request.password)?;

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .map_err(storage)?
            .is_some()
        {
            return Err(UserError::EmailConflict(email));
        }

        let password_hash = self.hasher.hash(&request.password).map_err(hashing)?;
        let user = self
            .user_repo
            .create(&NewUser {
                name,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => UserError::EmailConflict(request.email.clone()),
                other => storage(other),
            })?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, UserError> {
        self.user_repo
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or(UserError::NotFound)
    }

    pub async fn list_users(&self, page: PageRequest) -> Result<Page<User>, UserError> {
        let total = self.user_repo.count().await.map_err(storage)?;
        let users = self
            .user_repo
            .list(page.limit, page.skip)
            .await
            .map_err(storage)?;
        Ok(Page::new(users, total, page))
    }

    /// Apply a partial update. A new password is re-hashed.
    pub async fn update_user(
        &self,
        id: i64,
        request: UpdateUserRequest,
    ) -> Result<User, UserError> {
        let mut user = self.get_user(id).await?;

        if let Some(name) = &request.name {
            user.name = validate_name(name)?;
        }
        if let Some(email) = &request.email {
            let email = validate_email(email)?;
            if email != user.email {
                if let Some(other) = self.user_repo.get_by_email(&email).await.map_err(storage)? {
                    if other.id != user.id {
                        return Err(UserError::EmailConflict(email));
                    }
                }
                user.email = email;
            }
        }
        if let Some(password) = &request.password {
            validate_password(password)?;
            user.password_hash = self.hasher.hash(password).map_err(hashing)?;
        }

        let email = user.email.clone();
        self.user_repo.update(&user).await.map_err(|e| match e {
            RepositoryError::NotFound => UserError::NotFound,
            RepositoryError::Conflict(_) => UserError::EmailConflict(email),
            other => storage(other),
        })
    }

    /// Delete a user and every agent it owns. Either all of it goes or
    /// nothing does.
    pub async fn delete_user(&self, id: i64) -> Result<(), UserError> {
        self.user_repo.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => UserError::NotFound,
            other => storage(other),
        })?;

        info!(user_id = id, "User deleted");
        Ok(())
    }
}

fn storage(e: RepositoryError) -> UserError {
    UserError::StorageError(e.to_string())
}

fn hashing(e: AuthError) -> UserError {
    UserError::Hashing(e.to_string())
}

fn validate_name(name: &str) -> Result<String, UserError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UserError::Validation("name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

fn validate_email(email: &str) -> Result<String, UserError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(UserError::Validation(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}

fn validate_password(password: &str) -> Result<(), UserError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use captor_types::agent::{NewAgent, SchemaType};
    use crate::chat::repository::ChatRepository;
    use crate::repository::agent::AgentRepository;
    use crate::testing::{MemoryStore, PlainHasher};

    fn service(store: &MemoryStore) -> UserService<MemoryStore, PlainHasher> {
        UserService::new(store.clone(), PlainHasher)
    }

    fn signup_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: "Ada".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_hashes_password() {
        let store = MemoryStore::new();
        let user = service(&store)
            .signup(signup_request("ada@example.com"))
            .await
            .unwrap();
        assert_eq!(user.password_hash, "plain:correct horse");
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let service = service(&store);
        service.signup(signup_request("ada@example.com")).await.unwrap();

        let err = service
            .signup(signup_request("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::EmailConflict(_)));
    }

    #[tokio::test]
    async fn test_signup_short_password_rejected() {
        let store = MemoryStore::new();
        let mut request = signup_request("ada@example.com");
        request.password = "short".to_string();
        let err = service(&store).signup(request).await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
        assert!(store.state().users.is_empty());
    }

    #[tokio::test]
    async fn test_update_email_conflict() {
        let store = MemoryStore::new();
        let service = service(&store);
        service.signup(signup_request("ada@example.com")).await.unwrap();
        let bob = service.signup(signup_request("bob@example.com")).await.unwrap();

        let err = service
            .update_user(
                bob.id,
                UpdateUserRequest {
                    email: Some("ada@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::EmailConflict(_)));
    }

    #[tokio::test]
    async fn test_update_password_rehashes() {
        let store = MemoryStore::new();
        let service = service(&store);
        let user = service.signup(signup_request("ada@example.com")).await.unwrap();

        let updated = service
            .update_user(
                user.id,
                UpdateUserRequest {
                    password: Some("battery staple".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.password_hash, "plain:battery staple");
        assert_eq!(updated.name, "Ada");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_user_removes_owned_agents_only() {
        let store = MemoryStore::new();
        let service = service(&store);
        let ada = service.signup(signup_request("ada@example.com")).await.unwrap();
        let bob = service.signup(signup_request("bob@example.com")).await.unwrap();

        for owner in [ada.id, ada.id, bob.id] {
            let detail = AgentRepository::create(
                &store,
                &NewAgent {
                    user_id: owner,
                    name: "Support Bot".to_string(),
                    description: None,
                    system_prompt: None,
                    user_instructions: None,
                    webhook_url: None,
                },
                SchemaType::Qa,
                &[],
            )
            .await
            .unwrap();
            ChatRepository::create_session(&store, detail.agent.id, Some("Jane"), None)
                .await
                .unwrap();
        }

        service.delete_user(ada.id).await.unwrap();

        let state = store.state();
        assert_eq!(state.users.len(), 1);
        assert_eq!(state.agents.len(), 1);
        assert_eq!(state.agents[0].user_id, bob.id);
        assert_eq!(state.schemas.len(), 1);
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let store = MemoryStore::new();
        let err = service(&store).delete_user(99).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }
}
