use chrono::Utc;
use keeper_models::Secret;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use super::models::{NewSecret, SecretRecord};
use super::repository::SecretRepository;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found (id={0})")]
    NotFound(i64),

    #[error("no secrets found")]
    NoSecrets,

    #[error("failed to create secret: {0}")]
    Create(sqlx::Error),

    #[error("failed to store secret: {0}")]
    Store(sqlx::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Domain layer over `SecretRepository`; the only place a vanished row
/// becomes `SecretError::NotFound`.
pub struct SecretService {
    repository: SecretRepository,
}

impl SecretService {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            repository: SecretRepository::new(db),
        }
    }

    pub async fn get_secret(&self, id: i64, user_id: i64) -> Result<Secret, SecretError> {
        match self.repository.get(id, user_id).await {
            Ok(record) => Ok(record.into_wire()),
            Err(sqlx::Error::RowNotFound) => Err(SecretError::NotFound(id)),
            Err(e) => Err(SecretError::Database(e)),
        }
    }

    pub async fn get_user_secrets(&self, user_id: i64) -> Result<Vec<Secret>, SecretError> {
        let records = self.repository.list_by_user(user_id).await?;
        if records.is_empty() {
            return Err(SecretError::NoSecrets);
        }

        debug!(user_id = user_id, count = records.len(), "Secrets listed");
        Ok(records.into_iter().map(SecretRecord::into_wire).collect())
    }

    /// Persists a new secret and returns it with its id and timestamps
    pub async fn create_secret(&self, user_id: i64, secret: Secret) -> Result<Secret, SecretError> {
        let new_secret = NewSecret::from_wire(user_id, secret, Utc::now());

        let id = self
            .repository
            .create(&new_secret)
            .await
            .map_err(SecretError::Create)?;

        info!(user_id = user_id, secret_id = id, "Secret created");

        Ok(SecretRecord {
            id,
            user_id,
            title: new_secret.title,
            metadata: new_secret.metadata,
            secret_type: new_secret.secret_type,
            payload: new_secret.payload,
            created_at: new_secret.created_at,
            updated_at: new_secret.created_at,
        }
        .into_wire())
    }

    /// Overwrites an owned secret (last write wins)
    pub async fn update_secret(&self, user_id: i64, secret: Secret) -> Result<Secret, SecretError> {
        let id = secret.id;
        let record = SecretRecord::from_wire(user_id, secret, Utc::now());

        match self.repository.update(&record).await {
            Ok(stored) => {
                info!(user_id = user_id, secret_id = id, "Secret updated");
                Ok(stored.into_wire())
            }
            Err(sqlx::Error::RowNotFound) => Err(SecretError::NotFound(id)),
            Err(e) => Err(SecretError::Store(e)),
        }
    }

    pub async fn delete_secret(&self, id: i64, user_id: i64) -> Result<(), SecretError> {
        match self.repository.delete(id, user_id).await {
            Ok(()) => {
                info!(user_id = user_id, secret_id = id, "Secret deleted");
                Ok(())
            }
            Err(sqlx::Error::RowNotFound) => Err(SecretError::NotFound(id)),
            Err(e) => Err(SecretError::Database(e)),
        }
    }
}
