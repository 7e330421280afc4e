//! Secret database models

use chrono::{DateTime, Utc};
use keeper_models::{Secret, SecretType};
use sqlx::FromRow;

/// Row of the `secrets` table
#[derive(FromRow, Debug, Clone, PartialEq)]
pub struct SecretRecord {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub metadata: String,
    pub secret_type: String,
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert model; the id is assigned by the database
#[derive(Debug, Clone)]
pub struct NewSecret {
    pub user_id: i64,
    pub title: String,
    pub metadata: String,
    pub secret_type: String,
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl NewSecret {
    pub fn from_wire(user_id: i64, secret: Secret, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            title: secret.title,
            metadata: secret.metadata,
            secret_type: secret.secret_type.as_str().to_string(),
            payload: secret.payload,
            created_at: now,
        }
    }
}

impl SecretRecord {
    /// Update model for an existing row; `created_at` is kept from storage
    pub fn from_wire(user_id: i64, secret: Secret, now: DateTime<Utc>) -> Self {
        Self {
            id: secret.id,
            user_id,
            title: secret.title,
            metadata: secret.metadata,
            secret_type: secret.secret_type.as_str().to_string(),
            payload: secret.payload,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_wire(self) -> Secret {
        Secret {
            id: self.id,
            title: self.title,
            metadata: self.metadata,
            secret_type: SecretType::from(self.secret_type.as_str()),
            payload: self.payload,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
            content: None,
        }
    }
}
