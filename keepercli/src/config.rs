//! Client configuration

use rand::Rng;

use crate::cli::Cli;
use crate::error::ClientError;

/// Settings of one client process
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub client_id: u64,
    /// Salt for the session key; equal to `client_id` unless overridden
    pub key_salt: u64,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>, client_id: Option<u64>, key_salt: Option<u64>) -> Self {
        let client_id = client_id.unwrap_or_else(random_client_id);
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            client_id,
            key_salt: key_salt.unwrap_or(client_id),
        }
    }

    pub fn from_cli(cli: &Cli) -> Self {
        Self::new(cli.server.clone(), cli.client_id, cli.key_salt)
    }
}

/// Random id in `0..i32::MAX`
pub fn random_client_id() -> u64 {
    rand::thread_rng().gen_range(0..i32::MAX as u64)
}

/// Login and password from the command line or environment
pub fn credentials(cli: &Cli) -> Result<(String, String), ClientError> {
    let login = cli
        .login
        .clone()
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ClientError::Config("login is required (--login or KEEPER_LOGIN)".into()))?;
    let password = cli
        .password
        .clone()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            ClientError::Config("password is required (--password or KEEPER_PASSWORD)".into())
        })?;
    Ok((login, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_salt_defaults_to_client_id() {
        let config = ClientConfig::new("http://localhost:8080/", Some(5), None);

        assert_eq!(config.server_url, "http://localhost:8080");
        assert_eq!(config.client_id, 5);
        assert_eq!(config.key_salt, 5);

        let shared = ClientConfig::new("http://localhost:8080", Some(5), Some(9));
        assert_eq!(shared.key_salt, 9);
    }

    #[test]
    fn test_random_client_id_range() {
        for _ in 0..100 {
            assert!(random_client_id() < i32::MAX as u64);
        }
    }
}
