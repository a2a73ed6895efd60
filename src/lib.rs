//! `IsSunny` - find the nearest sunshine in Ireland
//!
//! This library provides a caching proxy in front of the Met Éireann point
//! forecast API and the aggregation that turns forecasts into a ranked list
//! of sunny towns.

pub mod api;
pub mod cache;
pub mod config;
pub mod distance;
pub mod error;
pub mod finder;
pub mod forecast;
pub mod logging;
pub mod models;
pub mod proxy;
pub mod registry;
pub mod symbol;
pub mod upstream;
pub mod warnings;
pub mod web;

// Re-export core types for public API
pub use cache::{CacheEntry, CacheStore};
pub use config::SunnyConfig;
pub use error::SunnyError;
pub use finder::SunshineFinder;
pub use forecast::ForecastParser;
pub use models::{Coordinate, DailyVerdict, Location, RankedLocation};
pub use proxy::{CacheStatus, ForecastProxy, ProxiedForecast, ProxyOptions};
pub use upstream::{MetEireannClient, NetworkError, UpstreamClient, UpstreamResponse};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SunnyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
