//! HTTP routing and server startup.

use std::sync::Arc;

use axum::middleware;
use axum::{response::Json, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::vault::{AzureConnector, VaultConnector};

use super::auth;
use super::listing;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Opens one vault session per listing request
    pub connector: Arc<dyn VaultConnector>,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let connector: Arc<dyn VaultConnector> = Arc::new(AzureConnector::new(&config)?);

    match config.vault_uri.as_deref() {
        Some(uri) => tracing::info!("Listing from vault {}", uri),
        None => tracing::warn!(
            "{} is not set; listing requests will fail until it is configured",
            crate::config::VAULT_URI_ENV
        ),
    }
    if config.function_key.is_none() {
        tracing::info!("FUNCTION_KEY not set; listing routes are open");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState { config, connector });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Build the application router.
///
/// Listing routes are served both at the root and under `/api`.
pub fn router(state: Arc<AppState>) -> Router {
    let listing_routes = Router::new()
        .route("/list-keys", get(listing::list_keys))
        .route("/list-secrets", get(listing::list_secrets));

    let protected_routes = Router::new()
        .merge(listing_routes.clone())
        .nest("/api", listing_routes)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_function_key,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(health))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
