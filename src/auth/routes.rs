//! Authentication routes

use axum::{routing::post, Router};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/users/register` - Create an account
/// - `POST /api/users/login` - Log in
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/users/register", post(handlers::register_handler))
        .route("/api/users/login", post(handlers::login_handler))
}
