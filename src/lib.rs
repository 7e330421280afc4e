//! Keeper server: accounts, per-user encrypted secret storage and push
//! notifications of secret changes.

use axum::{extract::Extension, middleware, routing::get, Router};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod auth;
pub mod common;
pub mod logging_middleware;
pub mod notifications;
pub mod secrets;

pub use common::{AppState, ServerConfig};

async fn health_handler() -> &'static str {
    "ok"
}

/// Composes every route with the shared state and logging layers
pub fn app(state: AppState) -> Router {
    let shared = Arc::new(RwLock::new(state));

    Router::new()
        .route("/health", get(health_handler))
        .merge(auth::auth_routes())
        .merge(secrets::secrets_routes())
        .merge(notifications::notifications_routes())
        .layer(middleware::from_fn(logging_middleware::log_request))
        .layer(Extension(shared))
        .layer(TraceLayer::new_for_http())
}

/// Serves `app(state)` on an already bound listener until it fails
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }
    axum::serve(listener, app(state).into_make_service()).await
}
