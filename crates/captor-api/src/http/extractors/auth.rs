//! Bearer token authentication extractor.
//!
//! Reads `Authorization: Bearer <token>`, verifies the token, and resolves
//! its subject to a live user. A token whose user was deleted, or whose
//! email changed since issue, is rejected.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use captor_types::user::User;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated caller. Extracting this validates the bearer token.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)?;
        let user = state.auth_service.authenticate(token).await?;
        Ok(CurrentUser(user))
    }
}

/// Extract the bearer token from the `Authorization` header.
fn extract_bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    let value = header.to_str().map_err(|_| {
        AppError::Unauthorized("Invalid Authorization header encoding".to_string())
    })?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::Unauthorized(
            "Provide a token via 'Authorization: Bearer <token>'".to_string(),
        )),
    }
}
