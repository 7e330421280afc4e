//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use keeper_models::CLIENT_ID_HEADER;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::tokens::verify_token;
use crate::common::{safe_token_log, ApiError, AppState};

/// Authenticated caller of a secret or notification route
///
/// Carries the token's user id and the per-process client id the caller
/// sent in the `X-Client-Id` header. Verification is stateless; the user
/// row is not looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthedUser {
    pub user_id: i64,
    pub client_id: u64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let jwt_secret = state_lock.read().await.jwt_secret.clone();

        let token = match parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        {
            Some(t) => t.to_string(),
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        let bare_token = token.strip_prefix("Bearer ").unwrap_or(&token);

        let claims = match verify_token(bare_token, &jwt_secret) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    error = %e,
                    token = %safe_token_log(bare_token),
                    "JWT token validation failed"
                );
                return Err(ApiError::Unauthorized("invalid token".into()));
            }
        };

        let client_id = parse_client_id(parts)?;

        debug!(
            user_id = claims.user_id,
            client_id = client_id,
            "Request authenticated"
        );

        Ok(AuthedUser {
            user_id: claims.user_id,
            client_id,
        })
    }
}

fn parse_client_id(parts: &Parts) -> Result<u64, ApiError> {
    let raw = parts
        .headers
        .get(CLIENT_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing client id".into()))?;

    raw.trim()
        .parse::<u64>()
        .map_err(|_| ApiError::BadRequest(format!("invalid client id: {}", raw)))
}
