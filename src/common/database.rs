// src/common/database.rs
//! SQLite pool construction

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// True for `sqlite::memory:` style URLs and `mode=memory` query strings
fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Opens a pool for `database_url`, creating the database file (and its
/// parent directory) when missing.
///
/// An in-memory database lives only as long as its connection, so memory
/// URLs get a single connection that is never recycled.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if is_memory_url(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?
    } else {
        SqlitePoolOptions::new().connect_with(connect_options).await?
    };

    info!(memory = is_memory_url(database_url), "Database pool ready");
    Ok(pool)
}

/// Fresh in-memory database with the schema applied
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    super::migrations::run_migrations(&pool)
        .await
        .expect("migrations");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_url_detection() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://file:keeper?mode=memory&cache=shared"));
        assert!(!is_memory_url("sqlite://keeper.db"));
    }

    #[tokio::test]
    async fn test_memory_pool_keeps_schema() {
        let pool = test_pool().await;

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'secrets') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(tables, vec!["secrets".to_string(), "users".to_string()]);
    }
}
