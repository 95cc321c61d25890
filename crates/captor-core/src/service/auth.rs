//! Credential verification and bearer-token authentication.
//!
//! The hashing and token formats are ports: `Argon2PasswordHasher` and
//! `JwtTokenCodec` live in captor-infra.

use captor_types::error::AuthError;
use captor_types::user::{AccessToken, LoginRequest, TokenClaims, User};
use tracing::debug;

use crate::repository::user::UserRepository;

/// Abstraction over password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing string.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Check a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Abstraction over bearer-token issuance and verification.
pub trait TokenCodec: Send + Sync {
    /// Issue a signed token for `user`.
    fn issue(&self, user: &User) -> Result<String, AuthError>;

    /// Verify signature and expiry, returning the embedded claims.
    fn decode(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Logs users in and resolves bearer tokens back to live users.
pub struct AuthService<U: UserRepository, P: PasswordHasher, T: TokenCodec> {
    user_repo: U,
    hasher: P,
    tokens: T,
}

impl<U: UserRepository, P: PasswordHasher, T: TokenCodec> AuthService<U, P, T> {
    pub fn new(user_repo: U, hasher: P, tokens: T) -> Self {
        Self {
            user_repo,
            hasher,
            tokens,
        }
    }

    /// Verify credentials and issue an access token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, request: &LoginRequest) -> Result<AccessToken, AuthError> {
        let user = self
            .user_repo
            .get_by_email(request.email.trim())
            .await
            .map_err(|e| AuthError::StorageError(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(&request.password, &user.password_hash)? {
            debug!(user_id = user.id, "Rejected login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(AccessToken {
            access_token: self.tokens.issue(&user)?,
            token_type: "bearer".to_string(),
        })
    }

    /// Resolve a bearer token to the user it was issued for.
    ///
    /// Tokens of deleted users, or issued before the user's email changed,
    /// are rejected.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.decode(token)?;
        let user = self
            .user_repo
            .get_by_id(claims.uid)
            .await
            .map_err(|e| AuthError::StorageError(e.to_string()))?
            .ok_or(AuthError::InvalidToken)?;

        if user.email != claims.sub {
            return Err(AuthError::InvalidToken);
        }
        Ok(user)
    }
}
