//! MiniLend risk API server binary entrypoint.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use minilend_common::config::AppConfig;

use minilend_api::routes::create_router;
use minilend_api::state::AppState;

const DEFAULT_LOG_FILTER: &str =
    "minilend_api=debug,minilend_reader=debug,minilend_engine=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    tracing::info!("Starting MiniLend risk API...");

    // Load configuration
    let config = AppConfig::from_env()?;
    let addr: SocketAddr = config
        .api_addr
        .parse()
        .map_err(|_| anyhow::anyhow!("MINILEND_API_ADDR must be a socket address"))?;

    if config.collateral_price_usd.is_none() {
        tracing::warn!(
            asset = %config.collateral_asset,
            "No seed price configured; metrics unavailable until a price is published"
        );
    }

    // Build application state
    let state = AppState::new(config)?;

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    tracing::info!("MiniLend risk API stopped.");
    Ok(())
}
