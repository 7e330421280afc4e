//! Command implementations driving the `Storage` contract

use keeper_models::{Blob, Card, Credentials, Secret, SecretPayload, TextNote, NO_SECRETS_MESSAGE};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::cli::{AddKind, Cli, Commands};
use crate::client::{ClientEvent, SyncClient};
use crate::config::{credentials, ClientConfig};
use crate::error::ClientError;
use crate::storage::{RemoteStorage, Storage};

pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = ClientConfig::from_cli(&cli);
    let client = Arc::new(SyncClient::new(config)?);
    let (login, password) = credentials(&cli)?;

    // Registering also signs the client in
    if let Commands::Register = cli.command {
        client.register(&login, &password).await?;
    } else {
        client.login(&login, &password).await?;
    }
    let storage = RemoteStorage::new(client.clone()).await?;

    run(cli.command, client, &storage, &login).await
}

async fn run(
    command: Commands,
    client: Arc<SyncClient>,
    storage: &RemoteStorage,
    login: &str,
) -> anyhow::Result<()> {
    match command {
        Commands::Register => println!("registered {}", login),
        Commands::List => list(storage).await?,
        Commands::Get { id } => {
            let secret = storage.get(id).await.map_err(with_salt_hint)?;
            print_secret(&secret);
        }
        Commands::Add { kind } => {
            let secret = build_secret(kind).await?;
            storage.create(&secret).await?;
            println!("saved {}", secret.title);
        }
        Commands::Edit {
            id,
            title,
            metadata,
        } => {
            let mut secret = storage.get(id).await.map_err(with_salt_hint)?;
            if let Some(title) = title {
                secret.title = title;
            }
            if let Some(metadata) = metadata {
                secret.metadata = metadata;
            }
            storage.update(&secret).await?;
            println!("updated {}", id);
        }
        Commands::Delete { id } => {
            storage.delete(id).await?;
            println!("deleted {}", id);
        }
        Commands::Watch => watch(client, storage).await?,
    }

    Ok(())
}

const SALT_HINT: &str =
    "secrets written under another key salt cannot be decrypted; set --key-salt or KEEPER_KEY_SALT to the same value on every run";

/// Decryption failures usually mean a different key salt was used to write
fn with_salt_hint(err: ClientError) -> anyhow::Error {
    match err {
        ClientError::Read(_) => anyhow::Error::new(err).context(SALT_HINT),
        other => other.into(),
    }
}

async fn list(storage: &dyn Storage) -> anyhow::Result<()> {
    let secrets = storage.get_all().await.map_err(with_salt_hint)?;
    if secrets.is_empty() {
        println!("{}", NO_SECRETS_MESSAGE);
        return Ok(());
    }

    for secret in &secrets {
        println!(
            "{:>6}  {:<10}  {}{}",
            secret.id,
            secret.secret_type.as_str(),
            secret.title,
            if secret.metadata.is_empty() {
                String::new()
            } else {
                format!("  ({})", secret.metadata)
            }
        );
    }
    Ok(())
}

fn print_secret(secret: &Secret) {
    println!("id:       {}", secret.id);
    println!("type:     {}", secret.secret_type);
    println!("title:    {}", secret.title);
    if !secret.metadata.is_empty() {
        println!("metadata: {}", secret.metadata);
    }
    match &secret.content {
        Some(SecretPayload::Blob(blob)) => {
            println!("file:     {} ({} bytes)", blob.file_name, blob.file_bytes.len())
        }
        Some(_) => println!("{}", secret.to_clipboard()),
        None => {}
    }
}

async fn build_secret(kind: AddKind) -> anyhow::Result<Secret> {
    let (title, metadata, content) = match kind {
        AddKind::Credential {
            title,
            username,
            secret,
            metadata,
        } => (
            title,
            metadata,
            SecretPayload::Credential(Credentials {
                login: username,
                password: secret,
            }),
        ),
        AddKind::Text {
            title,
            content,
            metadata,
        } => (title, metadata, SecretPayload::Text(TextNote { content })),
        AddKind::Card {
            title,
            number,
            exp_month,
            exp_year,
            cvv,
            metadata,
        } => (
            title,
            metadata,
            SecretPayload::Card(Card {
                number,
                exp_month,
                exp_year,
                cvv,
            }),
        ),
        AddKind::Blob {
            title,
            path,
            metadata,
        } => {
            let file_bytes = tokio::fs::read(&path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (
                title,
                metadata,
                SecretPayload::Blob(Blob {
                    file_name,
                    file_bytes,
                }),
            )
        }
    };

    let mut secret = Secret::with_content(title, content);
    secret.metadata = metadata;
    Ok(secret)
}

/// Prints one line per pushed change and re-lists
async fn watch(client: Arc<SyncClient>, storage: &RemoteStorage) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let listener = tokio::spawn(async move {
        if let Err(e) = client.listen(tx).await {
            warn!(error = %e, "Listener stopped");
        }
    });

    list(storage).await?;
    while let Some(ClientEvent::Reload {
        secret_id,
        was_update,
    }) = rx.recv().await
    {
        let action = if was_update { "updated" } else { "created" };
        println!("-- secret {} {} elsewhere, reloading", secret_id, action);
        list(storage).await?;
    }

    listener.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_failures_mention_key_salt() {
        let err = with_salt_hint(ClientError::Read("aead::Error".to_string()));
        assert_eq!(err.to_string(), SALT_HINT);
        assert!(err.chain().any(|cause| cause.to_string().contains("aead::Error")));

        let err = with_salt_hint(ClientError::ServerUnavailable);
        assert_eq!(err.to_string(), "server unavailable");
    }
}
