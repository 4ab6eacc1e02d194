mod api;
mod config;
mod storage;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::storage::PgRecipeStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("🚀 Starting Recipes API Server");

    // Load configuration
    let config = AppConfig::load()?;
    info!("📋 Configuration loaded");
    info!("   - Store: {}:{}/{}", config.database.host, config.database.port, config.database.name);
    info!("   - Server: {}", config.listen_addr());

    // Connect to the store; failure here is fatal
    info!("💾 Connecting to recipe store...");
    let store = PgRecipeStore::connect(&config.database).await?;
    store.ensure_schema().await?;
    info!("✅ Recipe store ready");

    let state = AppState::new(Arc::new(store));
    let app = api::router(state);

    // Start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Now serving recipes on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   GET    /health                   - Health check");
    info!("   GET    /v1/recipes               - List recipes");
    info!("   POST   /v1/recipes               - Create recipe");
    info!("   GET    /v1/recipes/{{id}}          - Get recipe");
    info!("   PUT    /v1/recipes/{{id}}          - Replace recipe");
    info!("   PATCH  /v1/recipes/{{id}}          - Replace recipe");
    info!("   DELETE /v1/recipes/{{id}}          - Delete recipe");
    info!("   POST   /v1/recipes/{{id}}/rating   - Rate recipe");
    info!("   POST   /v1/recipes/search        - Search recipes");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
