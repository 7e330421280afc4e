//! User account operations

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use rand::RngCore;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use super::models::User;
use crate::common::{safe_login_log, sortable_timestamp};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user already exists ({0})")]
    AlreadyExists(String),

    #[error("bad auth credentials")]
    BadCredentials,

    #[error("{0}")]
    InvalidInput(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub struct UserService {
    db: SqlitePool,
}

impl UserService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Creates an account; the password is stored only as an Argon2id hash
    pub async fn register_user(&self, login: &str, password: &str) -> Result<User, UserError> {
        validate_credentials(login, password)?;

        if self.find_by_login(login).await?.is_some() {
            warn!(login = %safe_login_log(login), "Registration rejected: login taken");
            return Err(UserError::AlreadyExists(login.to_string()));
        }

        let password_hash = hash_password(password)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (login, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(login)
        .bind(&password_hash)
        .bind(sortable_timestamp(now))
        .bind(sortable_timestamp(now))
        .execute(&self.db)
        .await;

        // A concurrent registration can slip past the lookup above
        let result = match result {
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(UserError::AlreadyExists(login.to_string()));
            }
            other => other?,
        };

        let user = User {
            id: result.last_insert_rowid(),
            login: login.to_string(),
            password_hash,
            created_at: now,
            updated_at: now,
        };

        info!(user_id = user.id, login = %safe_login_log(login), "User registered");
        Ok(user)
    }

    /// Unknown login and wrong password are indistinguishable to the caller
    pub async fn login_user(&self, login: &str, password: &str) -> Result<User, UserError> {
        validate_credentials(login, password)?;

        let user = match self.find_by_login(login).await? {
            Some(user) => user,
            None => {
                warn!(login = %safe_login_log(login), "Login failed: unknown login");
                return Err(UserError::BadCredentials);
            }
        };

        if !verify_password(password, &user.password_hash) {
            warn!(user_id = user.id, "Login failed: password mismatch");
            return Err(UserError::BadCredentials);
        }

        info!(user_id = user.id, "User logged in");
        Ok(user)
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, password_hash, created_at, updated_at
            FROM users
            WHERE login = ?
            "#,
        )
        .bind(login)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }
}

fn validate_credentials(login: &str, password: &str) -> Result<(), UserError> {
    if login.trim().is_empty() {
        return Err(UserError::InvalidInput("login must not be empty".to_string()));
    }
    if password.is_empty() {
        return Err(UserError::InvalidInput(
            "password must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, UserError> {
    let mut salt_bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
