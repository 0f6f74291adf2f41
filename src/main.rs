use std::sync::Arc;
use tracing::info;

use pan_search::{config::ServerConfig, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env()?;

    info!("Starting search proxy");
    info!("Search engine URL: {}", config.search_url);

    // No explicit timeout: outbound calls rely on transport defaults.
    let http_client = reqwest::Client::builder().build()?;

    let state = Arc::new(AppState::new(config.search_url, http_client));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Search proxy listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
