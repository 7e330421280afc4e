// src/logging_middleware.rs
//! Request logging middleware
//!
//! Bodies carry credentials and ciphertext, so only the request line,
//! status and latency are recorded.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(method = %method, uri = %uri, status = %status, latency_ms, "Request failed");
    } else {
        info!(method = %method, uri = %uri, status = %status, latency_ms, "Request handled");
    }

    response
}
