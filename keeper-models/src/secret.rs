use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Secret type tag
// ============================================================================

/// Classification of a secret; selects which payload variant the ciphertext holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretType {
    Credential,
    Text,
    Card,
    Blob,
    Unknown,
}

impl SecretType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretType::Credential => "credential",
            SecretType::Text => "text",
            SecretType::Card => "card",
            SecretType::Blob => "blob",
            SecretType::Unknown => "unknown",
        }
    }
}

impl From<&str> for SecretType {
    fn from(value: &str) -> Self {
        match value {
            "credential" => SecretType::Credential,
            "text" => SecretType::Text,
            "card" => SecretType::Card,
            "blob" => SecretType::Blob,
            _ => SecretType::Unknown,
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SecretType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SecretType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(SecretType::from(raw.as_str()))
    }
}

// ============================================================================
// Decrypted payload variants
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNote {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvv: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub file_name: String,
    #[serde(with = "crate::base64_bytes")]
    pub file_bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("secret type '{0}' has no payload")]
    UnsupportedType(SecretType),

    #[error("payload does not match secret type '{expected}' (found '{found}')")]
    TypeMismatch {
        expected: SecretType,
        found: SecretType,
    },

    #[error("secret has no decrypted content")]
    MissingContent,

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Plaintext content of a secret. Exactly one variant exists per secret type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretPayload {
    Credential(Credentials),
    Text(TextNote),
    Card(Card),
    Blob(Blob),
}

impl SecretPayload {
    pub fn secret_type(&self) -> SecretType {
        match self {
            SecretPayload::Credential(_) => SecretType::Credential,
            SecretPayload::Text(_) => SecretType::Text,
            SecretPayload::Card(_) => SecretType::Card,
            SecretPayload::Blob(_) => SecretType::Blob,
        }
    }

    /// Serialize the variant body (without any tag) to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        let bytes = match self {
            SecretPayload::Credential(creds) => serde_json::to_vec(creds)?,
            SecretPayload::Text(text) => serde_json::to_vec(text)?,
            SecretPayload::Card(card) => serde_json::to_vec(card)?,
            SecretPayload::Blob(blob) => serde_json::to_vec(blob)?,
        };
        Ok(bytes)
    }

    /// Deserialize bytes into the variant selected by `secret_type`
    pub fn from_bytes(secret_type: SecretType, bytes: &[u8]) -> Result<Self, PayloadError> {
        let payload = match secret_type {
            SecretType::Credential => SecretPayload::Credential(serde_json::from_slice(bytes)?),
            SecretType::Text => SecretPayload::Text(serde_json::from_slice(bytes)?),
            SecretType::Card => SecretPayload::Card(serde_json::from_slice(bytes)?),
            SecretType::Blob => SecretPayload::Blob(serde_json::from_slice(bytes)?),
            SecretType::Unknown => return Err(PayloadError::UnsupportedType(secret_type)),
        };
        Ok(payload)
    }
}

// ============================================================================
// Secret
// ============================================================================

/// A user secret as exchanged with the server.
///
/// `payload` is always ciphertext on the wire and at rest. `content` is filled
/// in only on a client after decryption and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub metadata: String,
    pub secret_type: SecretType,
    #[serde(default, with = "crate::base64_bytes")]
    pub payload: Vec<u8>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub content: Option<SecretPayload>,
}

impl Secret {
    /// A not-yet-persisted secret (id 0) of the given type
    pub fn new(secret_type: SecretType) -> Self {
        Self {
            id: 0,
            title: String::new(),
            metadata: String::new(),
            secret_type,
            payload: Vec::new(),
            created_at: None,
            updated_at: None,
            content: None,
        }
    }

    /// A not-yet-persisted secret whose type follows its content
    pub fn with_content(title: impl Into<String>, content: SecretPayload) -> Self {
        let mut secret = Secret::new(content.secret_type());
        secret.title = title.into();
        secret.content = Some(content);
        secret
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Serialized plaintext of `content`, checked against the type tag
    pub fn content_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        let content = self.content.as_ref().ok_or(PayloadError::MissingContent)?;
        if self.secret_type == SecretType::Unknown {
            return Err(PayloadError::UnsupportedType(self.secret_type));
        }
        if content.secret_type() != self.secret_type {
            return Err(PayloadError::TypeMismatch {
                expected: self.secret_type,
                found: content.secret_type(),
            });
        }
        content.to_bytes()
    }

    /// Human readable rendering of the decrypted content for the clipboard
    pub fn to_clipboard(&self) -> String {
        match &self.content {
            Some(SecretPayload::Credential(creds)) => {
                format!("login: {}\npassword: {}", creds.login, creds.password)
            }
            Some(SecretPayload::Card(card)) => format!(
                "Card Number: {}\nExp: {:02}/{}\nCVV: {}",
                card.number, card.exp_month, card.exp_year, card.cvv
            ),
            Some(SecretPayload::Text(text)) => format!("Text: {}", text.content),
            Some(SecretPayload::Blob(_)) => "File data cannot be moved to clipboard".to_string(),
            None => String::new(),
        }
    }
}
