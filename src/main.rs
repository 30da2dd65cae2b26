use anyhow::Result;
use route_enricher::{EnricherConfig, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = EnricherConfig::load()?;
    telemetry::init(&config.logging)?;

    tracing::info!(
        version = route_enricher::VERSION,
        weather = %config.weather.base_url,
        maps = %config.maps.base_url,
        concurrency = config.enrichment.max_concurrent_routes,
        "Starting route enricher"
    );

    web::run(config).await
}
