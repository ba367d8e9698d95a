use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pagestats::analytics::StatsAggregator;
use pagestats::api;
use pagestats::config::Config;
use pagestats::upstream::{PlausibleClient, StatsProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize upstream client
    let provider: Arc<dyn StatsProvider> = Arc::new(
        PlausibleClient::from_config(&config.upstream)
            .context("failed to build upstream stats client")?,
    );
    info!(
        "📊 Using stats API at {} (timeout {}s)",
        config.upstream.base_url, config.upstream.timeout_secs
    );
    info!(
        "   - breakdown limit {}, source lookup concurrency {}",
        config.stats.effective_limit(),
        config.stats.effective_concurrency()
    );

    let aggregator = StatsAggregator::new(provider, config.stats.clone());
    let api_router = api::create_api_router(aggregator);

    // Start API server
    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind {api_addr}"))?;
    info!("🚀 Server running on http://{}", api_addr);
    info!("   - Stats endpoint available at http://{}/api/stats", api_addr);

    axum::serve(api_listener, api_router).await?;

    Ok(())
}
