// Common module - shared types and utilities across all modules

pub mod config;
pub mod database;
pub mod error;
pub mod helpers;
pub mod migrations;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::ApiError;
pub use helpers::{safe_login_log, safe_token_log, sortable_timestamp};
pub use state::AppState;
