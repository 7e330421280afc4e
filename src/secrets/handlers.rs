//! Secret handlers

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use keeper_models::{SaveSecretResponse, Secret, SecretType};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::services::SecretService;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::notifications::NotifyError;

fn check_id(id: i64) -> Result<i64, ApiError> {
    if id < 0 {
        return Err(ApiError::BadRequest(format!("invalid secret id: {}", id)));
    }
    Ok(id)
}

/// GET /api/secrets
/// All secrets of the caller, most recently updated first
pub async fn list_secrets_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
) -> Result<Json<Vec<Secret>>, ApiError> {
    let db = state_lock.read().await.db.clone();
    let secrets = SecretService::new(db).get_user_secrets(user.user_id).await?;
    Ok(Json(secrets))
}

/// GET /api/secrets/:id
pub async fn get_secret_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(id): Path<i64>,
) -> Result<Json<Secret>, ApiError> {
    let id = check_id(id)?;
    let db = state_lock.read().await.db.clone();
    let secret = SecretService::new(db).get_secret(id, user.user_id).await?;
    Ok(Json(secret))
}

/// POST /api/secrets
/// Creates the secret when `id` is 0, otherwise overwrites the owned
/// secret with that id. Other clients of the same user are notified; a
/// failed fan-out never fails the save.
///
/// # Response
/// ```json
/// { "id": 17 }
/// ```
pub async fn save_secret_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Json(secret): Json<Secret>,
) -> Result<Json<SaveSecretResponse>, ApiError> {
    check_id(secret.id)?;
    if secret.secret_type == SecretType::Unknown {
        return Err(ApiError::BadRequest("unknown secret type".to_string()));
    }

    let state = state_lock.read().await.clone();
    let service = SecretService::new(state.db.clone());

    let was_update = secret.is_persisted();
    let saved = if was_update {
        service.update_secret(user.user_id, secret).await?
    } else {
        service.create_secret(user.user_id, secret).await?
    };

    match state
        .registry
        .notify(user.user_id, user.client_id, saved.id, was_update)
        .await
    {
        Ok(delivered) => debug!(
            user_id = user.user_id,
            secret_id = saved.id,
            delivered = delivered,
            "Secret change pushed"
        ),
        Err(NotifyError::NoSubscribers) => debug!(
            user_id = user.user_id,
            secret_id = saved.id,
            "No subscribers to notify"
        ),
    }

    Ok(Json(SaveSecretResponse { id: saved.id }))
}

/// DELETE /api/secrets/:id
pub async fn delete_secret_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let id = check_id(id)?;
    let db = state_lock.read().await.db.clone();

    SecretService::new(db)
        .delete_secret(id, user.user_id)
        .await
        .map_err(|e| {
            warn!(user_id = user.user_id, secret_id = id, error = %e, "Delete failed");
            e
        })?;

    Ok(StatusCode::NO_CONTENT)
}
