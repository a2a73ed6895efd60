use anyhow::{Context, Result};
use tracing::info;

use issunny::api::AppState;
use issunny::config::SunnyConfig;
use issunny::{logging, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = SunnyConfig::load().context("Failed to load configuration")?;
    logging::init(&config.logging)?;

    info!(
        "Starting IsSunny {} (cache ttl {}s, {} endpoint(s))",
        issunny::VERSION,
        config.proxy.ttl_seconds,
        config.proxy.endpoints.len()
    );

    let state = AppState::from_config(&config)?;
    let app = web::app(state, &config.server);
    web::run(&config.server, app).await
}
