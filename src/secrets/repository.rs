//! SQL access to the `secrets` table
//!
//! Every lookup is scoped by id *and* owner, so another user's row is
//! indistinguishable from a missing one. Errors are returned untranslated.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use super::models::{NewSecret, SecretRecord};
use crate::common::sortable_timestamp;

const SECRET_COLUMNS: &str =
    "id, user_id, title, metadata, secret_type, payload, created_at, updated_at";

#[derive(Clone)]
pub struct SecretRepository {
    db: SqlitePool,
}

impl SecretRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// `RowNotFound` when the row is absent or owned by someone else
    pub async fn get(&self, id: i64, user_id: i64) -> Result<SecretRecord, sqlx::Error> {
        sqlx::query_as::<_, SecretRecord>(&format!(
            "SELECT {} FROM secrets WHERE id = ? AND user_id = ?",
            SECRET_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await
    }

    /// Most recently updated first
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<SecretRecord>, sqlx::Error> {
        sqlx::query_as::<_, SecretRecord>(&format!(
            "SELECT {} FROM secrets WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
            SECRET_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
    }

    pub async fn create(&self, secret: &NewSecret) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO secrets (user_id, title, metadata, secret_type, payload, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(secret.user_id)
        .bind(&secret.title)
        .bind(&secret.metadata)
        .bind(&secret.secret_type)
        .bind(&secret.payload)
        .bind(sortable_timestamp(secret.created_at))
        .bind(sortable_timestamp(secret.created_at))
        .execute(&self.db)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Lock-then-verify update of an owned row.
    ///
    /// `BEGIN IMMEDIATE` takes the database write lock before the row is
    /// read, so a concurrent delete either commits first (the read finds
    /// nothing) or waits behind this update. Both a missing row and a
    /// zero-row update roll back with `RowNotFound`. Returns the stored row.
    pub async fn update(&self, secret: &SecretRecord) -> Result<SecretRecord, sqlx::Error> {
        let mut conn = self.db.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let outcome = match Self::update_locked(&mut *conn, secret).await {
            Ok(stored) => sqlx::query("COMMIT")
                .execute(&mut *conn)
                .await
                .map(|_| stored),
            Err(e) => Err(e),
        };

        if outcome.is_err() {
            if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                // Never hand a connection with an open transaction back to the pool
                warn!(error = %e, "Rollback failed, dropping connection");
                drop(conn.detach());
            }
        }
        outcome
    }

    async fn update_locked(
        conn: &mut SqliteConnection,
        secret: &SecretRecord,
    ) -> Result<SecretRecord, sqlx::Error> {
        let existing = sqlx::query_as::<_, SecretRecord>(&format!(
            "SELECT {} FROM secrets WHERE id = ? AND user_id = ?",
            SECRET_COLUMNS
        ))
        .bind(secret.id)
        .bind(secret.user_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(existing) = existing else {
            debug!(secret_id = secret.id, user_id = secret.user_id, "Update target missing");
            return Err(sqlx::Error::RowNotFound);
        };

        let result = sqlx::query(
            r#"
            UPDATE secrets
            SET title = ?, metadata = ?, secret_type = ?, payload = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&secret.title)
        .bind(&secret.metadata)
        .bind(&secret.secret_type)
        .bind(&secret.payload)
        .bind(sortable_timestamp(secret.updated_at))
        .bind(secret.id)
        .bind(secret.user_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() != 1 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(SecretRecord {
            created_at: existing.created_at,
            ..secret.clone()
        })
    }

    /// `RowNotFound` when nothing was removed
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM secrets WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}
