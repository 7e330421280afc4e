//! # Keeper Models
//!
//! Wire types shared by the keeper server and its clients:
//! - `Secret` and its type tag, as stored and transmitted (payload is ciphertext)
//! - `SecretPayload`, the decrypted typed content that only exists on a client
//! - `PushEvent`, the change notification pushed over the subscription stream
//! - request/response bodies for the auth and secret routes

pub mod api;
pub mod notification;
pub mod secret;

pub use api::{AuthRequest, AuthResponse, ErrorResponse, SaveSecretResponse};
pub use notification::PushEvent;
pub use secret::{
    Blob, Card, Credentials, PayloadError, Secret, SecretPayload, SecretType, TextNote,
};

/// Header carrying the per-process client identifier on authenticated calls.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Message reported by the server when a user has no stored secrets.
///
/// Clients compare against this to tell an empty account from a failed fetch.
pub const NO_SECRETS_MESSAGE: &str = "no secrets found";

/// Serde adapter encoding byte buffers as standard base64 strings.
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
