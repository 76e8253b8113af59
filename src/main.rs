use std::sync::Arc;

use alkifor::api::{self, AppState};
use alkifor::attachments::AttachmentStore;
use alkifor::auth::AuthService;
use alkifor::repository::{SqlitePropertyRepository, SqliteUserRepository};
use alkifor::{store, Config};
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🏠 AlkiFor - property listing backend");

    let config = Config::from_env().context("Failed to load configuration")?;

    // The store must be reachable before anything is served
    let pool = store::connect(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database_url))?;

    let attachments = AttachmentStore::new(&config.upload_dir);
    attachments
        .ensure_dir()
        .await
        .context("Failed to create upload directory")?;
    info!(dir = %attachments.dir().display(), "attachments directory ready");

    let state = AppState {
        properties: Arc::new(SqlitePropertyRepository::new(
            pool.clone(),
            attachments.clone(),
        )),
        auth: AuthService::new(Arc::new(SqliteUserRepository::new(pool))),
        attachments,
        default_owner_id: config.default_owner_id,
    };

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("listening on http://localhost:{}", config.port);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
