//! Secret routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the secrets router
///
/// # Routes
/// - `GET /api/secrets` - List the caller's secrets
/// - `POST /api/secrets` - Create (id 0) or update a secret
/// - `GET /api/secrets/:id` - Fetch one secret
/// - `DELETE /api/secrets/:id` - Delete one secret
pub fn secrets_routes() -> Router {
    Router::new()
        .route(
            "/api/secrets",
            get(handlers::list_secrets_handler).post(handlers::save_secret_handler),
        )
        .route(
            "/api/secrets/:id",
            get(handlers::get_secret_handler).delete(handlers::delete_secret_handler),
        )
}
