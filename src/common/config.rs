// src/common/config.rs
//! Server configuration loaded from environment variables
//!
//! `main` calls `dotenv()` first, so a `.env` file in the working directory
//! is honoured as well.

use chrono::Duration;
use std::env;
use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://keeper.db";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        // Signing key for access tokens; there is no safe default
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let token_ttl_minutes = match lookup("TOKEN_TTL_MINUTES") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or(ConfigError::Invalid {
                    name: "TOKEN_TTL_MINUTES",
                    value: raw,
                })?,
            None => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                name: "HOST",
                value: host,
            })?;

        Ok(Self {
            database_url,
            jwt_secret,
            token_ttl: Duration::minutes(token_ttl_minutes),
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_secret_only() {
        let config = ServerConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.database_url, "sqlite://keeper.db");
        assert_eq!(config.token_ttl, Duration::minutes(60));
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let result = ServerConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_port = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("PORT", "http"),
        ]));
        assert!(matches!(bad_port, Err(ConfigError::Invalid { name: "PORT", .. })));

        let bad_ttl = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_MINUTES", "0"),
        ]));
        assert!(bad_ttl.is_err());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9443"),
            ("TOKEN_TTL_MINUTES", "15"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9443");
        assert_eq!(config.token_ttl, Duration::minutes(15));
    }
}
