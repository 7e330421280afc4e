//! Client error vocabulary
//!
//! Transport problems collapse into three fixed messages; every other
//! server failure passes through with the server's own message.

use keeper_models::NO_SECRETS_MESSAGE;
use thiserror::Error;

use crate::crypto::CryptoError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server unavailable")]
    ServerUnavailable,

    #[error("failed to authenticate")]
    AuthenticationFailed,

    #[error("user already exists")]
    AlreadyExists,

    #[error("request timed out")]
    Timeout,

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("failed to read secret: {0}")]
    Read(String),

    #[error("failed to write secret: {0}")]
    Write(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("notification stream error: {0}")]
    Stream(String),

    #[error("malformed notification: {0}")]
    MalformedNotification(#[from] serde_json::Error),

    #[error("already listening for notifications")]
    AlreadyListening,

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// True for the server's answer to listing an empty account
    pub fn is_no_secrets(&self) -> bool {
        matches!(
            self,
            ClientError::Status { status: 404, message } if message == NO_SECRETS_MESSAGE
        )
    }

    /// Maps a non-success HTTP status and its error message
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ClientError::AuthenticationFailed,
            409 => ClientError::AlreadyExists,
            _ => ClientError::Status { status, message },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::ServerUnavailable
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match err {
            WsError::Io(_) => ClientError::ServerUnavailable,
            WsError::Http(response) => {
                let status = response.status().as_u16();
                ClientError::from_status(status, format!("subscribe rejected ({})", status))
            }
            other => ClientError::Stream(other.to_string()),
        }
    }
}
