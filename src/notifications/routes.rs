//! Notification routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the notifications router
///
/// # Routes
/// - `GET /ws/notifications` - WebSocket stream of secret changes
pub fn notifications_routes() -> Router {
    Router::new().route("/ws/notifications", get(handlers::subscribe_handler))
}
