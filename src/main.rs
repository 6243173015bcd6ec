//! Storefront Cache - solar storefront API server
//!
//! Serves the catalog behind the in-process response cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_cache::catalog::{DataSource, InMemoryCatalog};
use storefront_cache::{create_router, AppState, Config};

/// Main entry point for the storefront server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Load the catalog from `CATALOG_PATH` or the bundled seed
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storefront server");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        products_ttl = config.products_cache_duration,
        categories_ttl = config.categories_cache_duration,
        default_ttl = config.default_cache_duration,
        admin_enabled = config.admin_token.is_some(),
        "Configuration loaded"
    );

    let catalog = match &config.catalog_path {
        Some(path) => InMemoryCatalog::from_file(path)
            .await
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => InMemoryCatalog::builtin().context("failed to load bundled catalog")?,
    };
    let catalog: Arc<dyn DataSource> = Arc::new(catalog);
    info!("Catalog loaded");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let app = create_router(AppState::new(config, catalog));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
