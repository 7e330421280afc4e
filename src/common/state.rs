// Application state shared across all modules

use chrono::Duration;
use sqlx::SqlitePool;

use crate::notifications::SubscriberRegistry;

/// Application state containing database pool, token settings and the
/// notification registry
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub registry: SubscriberRegistry,
}

impl AppState {
    pub fn new(db: SqlitePool, jwt_secret: impl Into<String>, token_ttl: Duration) -> Self {
        Self {
            db,
            jwt_secret: jwt_secret.into(),
            token_ttl,
            registry: SubscriberRegistry::new(),
        }
    }
}
