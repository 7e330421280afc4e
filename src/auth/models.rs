//! Authentication data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Issuer stamped into and required from every access token
pub const TOKEN_ISSUER: &str = "keeper";

/// JWT claims structure
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub user_id: i64,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// User database model
#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
