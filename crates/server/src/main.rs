mod logging;

use std::sync::Arc;

use anyhow::Context;
use api::{router, AppState};
use auth::SessionManager;
use sessionkit_core::AppConfig;
use storage::SqliteStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, overrides) = AppConfig::load_with_env().context("failed to load configuration")?;
    logging::init(&config.logging)?;

    for key in &overrides {
        info!(key = %key, "configuration overridden from environment");
    }

    let store = Arc::new(
        SqliteStore::open(&config.database.path)
            .with_context(|| format!("failed to open database at {}", config.database.path))?,
    );
    info!(path = %config.database.path, "database ready");

    let sessions = SessionManager::new(
        store.clone(),
        store,
        config.auth.jwt_secret.clone(),
        config.auth.token_settings()?,
    );
    let app = router::router(Arc::new(AppState::new(sessions)));

    let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
    let addr = listener.local_addr()?;

    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
