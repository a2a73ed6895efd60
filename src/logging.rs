use anyhow::{Result, anyhow};
use tracing_subscriber::{
    EnvFilter, fmt,
    filter::LevelFilter,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::LoggingConfig;

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level.
pub fn init(logging: &LoggingConfig) -> Result<()> {
    let level: LevelFilter = logging
        .level
        .parse()
        .map_err(|_| anyhow!("Invalid log level '{}'", logging.level))?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        _ => fmt::layer().pretty().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| anyhow!("Failed to install tracing subscriber: {err}"))
}
