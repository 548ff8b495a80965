use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemFileStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use study_server::config::AppConfig;
use study_server::realtime::ChatHub;
use study_server::state::AppState;
use study_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    seed::seed_role_permissions(&db).await?;
    seed::ensure_indexes(&db).await?;
    seed::seed_admin(&db, &config.auth).await?;

    let files = FilesystemFileStore::new(&config.storage.data_dir, config.storage.max_upload_size)
        .await
        .context("Failed to open upload directory")?;

    let hub = Arc::new(ChatHub::new());
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;

    let state = AppState {
        db,
        config: Arc::new(config),
        files: Arc::new(files),
        hub: hub.clone(),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping every subscriber ends the per-connection writer tasks.
    hub.clear();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
