//! Harness running a real keeper server in-process on an ephemeral port,
//! backed by a private in-memory database.

use keeper_api::common::{database, migrations};
use keeper_api::notifications::SubscriberRegistry;
use keeper_api::AppState;
use keepercli::{ClientConfig, RemoteStorage, SyncClient};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

pub const JWT_SECRET: &str = "e2e-test-secret";

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub struct TestServer {
    pub base_url: String,
    pub registry: SubscriberRegistry,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> anyhow::Result<Self> {
        init_tracing();

        let pool = database::connect("sqlite::memory:").await?;
        migrations::run_migrations(&pool).await?;

        let state = AppState::new(pool, JWT_SECRET, chrono::Duration::minutes(60));
        let registry = state.registry.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            if let Err(e) = keeper_api::serve(listener, state).await {
                tracing::error!(error = %e, "Test server stopped");
            }
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            registry,
            handle,
        })
    }

    /// Client with a fixed id; `key_salt` is shared by sessions that must
    /// read each other's secrets
    pub fn client(&self, client_id: u64, key_salt: u64) -> anyhow::Result<Arc<SyncClient>> {
        let config = ClientConfig::new(self.base_url.clone(), Some(client_id), Some(key_salt));
        Ok(Arc::new(SyncClient::new(config)?))
    }

    /// Logged-in client plus its storage adapter
    pub async fn session(
        &self,
        login: &str,
        password: &str,
        client_id: u64,
        key_salt: u64,
    ) -> anyhow::Result<(Arc<SyncClient>, RemoteStorage)> {
        let client = self.client(client_id, key_salt)?;
        client.login(login, password).await?;
        let storage = RemoteStorage::new(client.clone()).await?;
        Ok((client, storage))
    }

    /// Server-side close of every notification stream held by `user_id`
    pub async fn drop_subscriptions(&self, user_id: i64) -> usize {
        self.registry.disconnect_user(user_id).await
    }

    /// Waits until the registry holds `count` live subscribers
    pub async fn wait_for_subscribers(&self, count: usize) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.registry.total_subscribers().await != count {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("expected {} subscribers", count);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
