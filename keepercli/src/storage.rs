//! Encrypted secret storage backed by the keeper server.
//!
//! Payloads are serialized and sealed with the session key before they
//! leave the process, and opened again after every fetch.

use async_trait::async_trait;
use keeper_models::{Secret, SecretPayload};
use std::sync::Arc;
use tracing::debug;

use crate::client::SyncClient;
use crate::crypto::{self, SessionKey};
use crate::error::ClientError;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, id: i64) -> Result<Secret, ClientError>;
    async fn get_all(&self) -> Result<Vec<Secret>, ClientError>;
    async fn create(&self, secret: &Secret) -> Result<(), ClientError>;
    async fn update(&self, secret: &Secret) -> Result<(), ClientError>;
    async fn delete(&self, id: i64) -> Result<(), ClientError>;
}

pub struct RemoteStorage {
    client: Arc<SyncClient>,
    key: SessionKey,
}

impl RemoteStorage {
    /// Derives the session key from the client's password and key salt;
    /// the client has to be logged in.
    pub async fn new(client: Arc<SyncClient>) -> Result<Self, ClientError> {
        let password = client
            .password()
            .await
            .ok_or(ClientError::AuthenticationFailed)?;
        let key = crypto::derive_key(&password, client.key_salt())?;

        Ok(Self { client, key })
    }

    pub fn client(&self) -> &Arc<SyncClient> {
        &self.client
    }

    async fn write(&self, secret: &Secret) -> Result<(), ClientError> {
        let sealed = seal(secret, &self.key)?;
        let id = self.client.save_secret(&sealed).await?;
        debug!(secret_id = id, "Secret written");
        Ok(())
    }
}

/// Copy of `secret` whose payload is the encrypted content
pub fn seal(secret: &Secret, key: &SessionKey) -> Result<Secret, ClientError> {
    let plaintext = secret
        .content_bytes()
        .map_err(|e| ClientError::Write(e.to_string()))?;
    let payload = crypto::encrypt(&plaintext, key).map_err(|e| ClientError::Write(e.to_string()))?;

    Ok(Secret {
        payload,
        content: None,
        ..secret.clone()
    })
}

/// Decrypts the payload into the variant named by the type tag
pub fn open(mut secret: Secret, key: &SessionKey) -> Result<Secret, ClientError> {
    let plaintext =
        crypto::decrypt(&secret.payload, key).map_err(|e| ClientError::Read(e.to_string()))?;
    let content = SecretPayload::from_bytes(secret.secret_type, &plaintext)
        .map_err(|e| ClientError::Read(e.to_string()))?;

    secret.content = Some(content);
    Ok(secret)
}

#[async_trait]
impl Storage for RemoteStorage {
    async fn get(&self, id: i64) -> Result<Secret, ClientError> {
        let secret = self.client.load_secret(id).await?;
        open(secret, &self.key)
    }

    /// An empty account yields an empty list
    async fn get_all(&self) -> Result<Vec<Secret>, ClientError> {
        let secrets = match self.client.load_secrets().await {
            Ok(secrets) => secrets,
            Err(e) if e.is_no_secrets() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        secrets
            .into_iter()
            .map(|secret| open(secret, &self.key))
            .collect()
    }

    async fn create(&self, secret: &Secret) -> Result<(), ClientError> {
        if secret.is_persisted() {
            return Err(ClientError::Write(format!(
                "secret {} already exists; use update",
                secret.id
            )));
        }
        self.write(secret).await
    }

    async fn update(&self, secret: &Secret) -> Result<(), ClientError> {
        if !secret.is_persisted() {
            return Err(ClientError::Write(
                "secret has not been created yet".to_string(),
            ));
        }
        self.write(secret).await
    }

    async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.client.delete_secret(id).await
    }
}
