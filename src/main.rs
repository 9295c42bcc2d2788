//! keyvault-lister - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the listing API.

use keyvault_lister::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyvault_lister=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: api_version={}, timeout={:?}",
        config.api_version, config.request_timeout
    );

    api::serve(config).await
}
