//! Altar Server — application entry point.

use altar_db::{DbManager, run_migrations};
use altar_server::config::ServerConfig;
use altar_server::state::AppState;
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("altar=info")),
        )
        .json()
        .init();

    info!("Starting Altar server");

    let config = ServerConfig::load()?;

    let db = DbManager::connect(&config.db)
        .await
        .context("Failed to connect to SurrealDB")?;
    run_migrations(db.client())
        .await
        .context("Failed to apply schema migrations")?;

    let _state = AppState::build(&config.auth, db.client())?;
    info!(
        legacy_wedding = ?config.auth.legacy_wedding_id,
        peppered = config.auth.pepper.is_some(),
        "Auth core ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Altar server stopped");
    Ok(())
}
