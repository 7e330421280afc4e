// src/main.rs
use dotenv::dotenv;
use keeper_api::common::{database, migrations};
use keeper_api::{AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    let config = ServerConfig::from_env()?;
    info!(
        database_url = %config.database_url,
        token_ttl_minutes = config.token_ttl.num_minutes(),
        "Configuration loaded"
    );

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    let pool = database::connect(&config.database_url).await?;
    migrations::run_migrations(&pool).await?;

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let state = AppState::new(pool, config.jwt_secret, config.token_ttl);
    let listener = TcpListener::bind(config.bind_addr).await?;
    keeper_api::serve(listener, state).await?;

    Ok(())
}
