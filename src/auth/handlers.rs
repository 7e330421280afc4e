//! Authentication handlers

use axum::extract::{Extension, Json};
use keeper_models::{AuthRequest, AuthResponse};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::models::User;
use super::services::UserService;
use super::tokens::create_token;
use crate::common::{ApiError, AppState};

/// POST /api/users/register
/// Creates an account and returns an access token for it
///
/// # Request Body
/// ```json
/// { "login": "alice", "password": "..." }
/// ```
///
/// # Response
/// ```json
/// { "access_token": "<jwt>" }
/// ```
pub async fn register_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = UserService::new(state.db.clone())
        .register_user(&payload.login, &payload.password)
        .await?;

    issue_token(&state, &user)
}

/// POST /api/users/login
/// Exchanges login and password for an access token
pub async fn login_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = UserService::new(state.db.clone())
        .login_user(&payload.login, &payload.password)
        .await?;

    issue_token(&state, &user)
}

fn issue_token(state: &AppState, user: &User) -> Result<Json<AuthResponse>, ApiError> {
    let access_token = create_token(user.id, state.token_ttl, &state.jwt_secret).map_err(|e| {
        error!(error = %e, user_id = user.id, "Failed to sign access token");
        ApiError::InternalServer("failed to create token".to_string())
    })?;

    info!(user_id = user.id, "Access token issued");
    Ok(Json(AuthResponse { access_token }))
}
