// ============================================================================
// FamEdu API - Bearer Authentication
// File: crates/famedu-api/src/middleware/auth.rs
// ============================================================================
//! Resolves `Authorization: Bearer <token>` to the stored user.
//!
//! The user row is reloaded on every request so role, family and active
//! flag are never taken from a stale token. Deactivated accounts are
//! rejected here, before any permission check runs.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use famedu_core::authz::Principal;
use famedu_core::{DomainError, User};

use crate::error::ApiError;
use crate::state::AppState;

pub struct AuthUser(pub User);

impl AuthUser {
    pub fn principal(&self) -> Principal {
        self.0.principal()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;

        match state.auth.authenticate(token).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(DomainError::UserNotActive) => {
                Err(ApiError::Unauthorized("account deactivated".into()))
            }
            Err(DomainError::InvalidToken(reason)) => Err(ApiError::Unauthorized(reason)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
