//! The HTTP surface and index cache: the axum router serving catalogs
//! stored by `catalog-store`, plus graceful shutdown and tracing setup.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use catalog_config::RuntimeConfig;
use catalog_store::CatalogStore;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod handlers;
mod index_loader;
mod init;
mod state;

use handlers::{get_all, get_query, healthz, not_found};
use index_loader::IndexLoader;
use state::AppState;

pub use init::init_tracing;

/// Builds the router for a given store and configuration. Split out from
/// [`run`] so integration tests can mount it on an arbitrary listener.
pub fn router(store: Arc<CatalogStore>, config: &RuntimeConfig) -> Router {
    let state = AppState {
        store,
        index_loader: Arc::new(IndexLoader::new()),
        url_prefix: config.store.url_prefix.clone(),
        gzip_threshold_bytes: config.server.gzip_threshold_bytes,
    };

    let prefix = state.url_prefix.trim_end_matches('/').to_string();

    Router::new()
        .route(&format!("{prefix}/:catalog/api/v1/all"), get(get_all))
        .route(&format!("{prefix}/:catalog/api/v1/query"), get(get_query))
        .route("/healthz", get(healthz))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Loads (and validates) config, opens the catalog store, binds the
/// listener, and serves until a shutdown signal arrives.
pub async fn run(config: RuntimeConfig) -> Result<()> {
    let store = Arc::new(
        CatalogStore::new(&config.store.root_dir, &config.store.base_url)
            .await
            .context("failed to open catalog store")?,
    );

    let app = router(store, &config);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))?;

    info!(addr = %config.server.listen_addr, prefix = %config.store.url_prefix, "catalogd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("catalogd shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
