//! HS256 JSON Web Tokens for bearer authentication.
//!
//! Signing, signature verification and the `exp` check are delegated to
//! `jsonwebtoken`. Tokens carry [`TokenClaims`] as their payload.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};

use captor_core::service::auth::TokenCodec;
use captor_types::error::AuthError;
use captor_types::user::{TokenClaims, User};

/// Issues and verifies HS256 bearer tokens.
pub struct JwtTokenCodec {
    secret: SecretString,
    ttl_minutes: i64,
}

impl JwtTokenCodec {
    pub fn new(secret: SecretString, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl_minutes,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; the ttl is the only grace period.
        validation.leeway = 0;
        validation
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, user: &User) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: user.email.clone(),
            uid: user.id,
            iat,
            exp: iat + self.ttl_minutes * 60,
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|_| AuthError::InvalidToken)
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let data = decode::<TokenClaims>(token, &key, &Self::validation()).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, email: &str) -> User {
        User {
            id,
            name: "Ada".to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn codec(ttl_minutes: i64) -> JwtTokenCodec {
        JwtTokenCodec::new(SecretString::from("test-secret"), ttl_minutes)
    }

    #[test]
    fn test_issue_and_decode() {
        let codec = codec(60);
        let token = codec.issue(&user(7, "ada@example.com")).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.sub, "ada@example.com");
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec(60);
        let token = codec.issue(&user(7, "ada@example.com")).unwrap();
        let admin = JwtTokenCodec::new(SecretString::from("attacker-secret"), 60)
            .issue(&user(1, "admin@example.com"))
            .unwrap();

        // Ada's header and signature around the admin payload.
        let parts: Vec<&str> = token.split('.').collect();
        let admin_payload = admin.split('.').nth(1).unwrap();
        let forged = format!("{}.{admin_payload}.{}", parts[0], parts[2]);

        assert!(matches!(codec.decode(&forged), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_other_key_rejected() {
        let token = codec(60).issue(&user(7, "ada@example.com")).unwrap();
        let other = JwtTokenCodec::new(SecretString::from("another-secret"), 60);
        assert!(matches!(other.decode(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let codec = codec(-1);
        let token = codec.issue(&user(7, "ada@example.com")).unwrap();
        assert!(matches!(codec.decode(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = codec(60);
        for token in ["", "abc", "abc.zz", "abc.0", "a.b.c"] {
            assert!(matches!(codec.decode(token), Err(AuthError::InvalidToken)));
        }
    }
}
