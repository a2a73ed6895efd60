//! Caching forecast proxy
//!
//! Serves provider documents from the cache while they are fresh, refetches
//! once they are stale and falls back to the stale copy when the provider
//! cannot deliver a usable document.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::cache::CacheStore;
use crate::config::ProxyConfig;
use crate::forecast::has_forecast_markers;
use crate::models::Coordinate;
use crate::upstream::UpstreamClient;
use crate::{Result, SunnyError};

pub const MET_EIREANN_ENDPOINT: &str =
    "http://openaccess.pf.api.met.ie/metno-wdb2ts/locationforecast?lat={lat};long={lon}";

/// Forecast documents keyed by coordinate
pub type ForecastCache = CacheStore<String, Arc<str>>;

/// Where a served document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    /// Fresh cache entry
    Hit,
    /// Fetched from the provider just now
    Miss,
    /// Expired cache entry served because the provider failed
    Stale,
}

impl CacheStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Stale => "STALE",
        }
    }
}

/// A forecast document tagged with its cache outcome
#[derive(Debug, Clone, PartialEq)]
pub struct ProxiedForecast {
    pub document: Arc<str>,
    pub cache_status: CacheStatus,
}

#[derive(Debug, Clone)]
pub struct ProxyOptions {
    pub ttl: TimeDelta,
    pub max_entries: usize,
    pub evict_count: usize,
    /// Bound on each upstream attempt
    pub timeout: Duration,
    /// Endpoint templates, tried in order
    pub endpoints: Vec<String>,
    /// Decimal places kept in cache keys, `None` keeps coordinates as given
    pub rounding_precision: Option<u32>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            ttl: TimeDelta::hours(3),
            max_entries: 200,
            evict_count: 50,
            timeout: Duration::from_secs(15),
            endpoints: vec![MET_EIREANN_ENDPOINT.to_string()],
            rounding_precision: None,
        }
    }
}

impl From<&ProxyConfig> for ProxyOptions {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            ttl: TimeDelta::seconds(i64::from(config.ttl_seconds)),
            max_entries: config.max_entries,
            evict_count: config.evict_count,
            timeout: Duration::from_secs(config.timeout_seconds),
            endpoints: config.endpoints.clone(),
            rounding_precision: config.rounding_precision,
        }
    }
}

pub struct ForecastProxy {
    cache: Arc<ForecastCache>,
    upstream: Arc<dyn UpstreamClient>,
    options: ProxyOptions,
}

impl ForecastProxy {
    #[must_use]
    pub fn new(
        cache: Arc<ForecastCache>,
        upstream: Arc<dyn UpstreamClient>,
        options: ProxyOptions,
    ) -> Self {
        Self {
            cache,
            upstream,
            options,
        }
    }

    /// Build the proxy together with an empty cache sized from `options`
    #[must_use]
    pub fn with_fresh_cache(upstream: Arc<dyn UpstreamClient>, options: ProxyOptions) -> Self {
        let cache = Arc::new(CacheStore::new(options.max_entries, options.evict_count));
        Self::new(cache, upstream, options)
    }

    #[must_use]
    pub fn options(&self) -> &ProxyOptions {
        &self.options
    }

    #[must_use]
    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    /// Fetch the forecast document for `coordinate` as of `now`
    #[instrument(skip(self, now), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn fetch_forecast(
        &self,
        coordinate: &Coordinate,
        now: DateTime<Utc>,
    ) -> Result<ProxiedForecast> {
        let key = coordinate.cache_key(self.options.rounding_precision);
        let cached = self.cache.get(&key);

        if let Some(entry) = &cached {
            if entry.is_fresh(now, self.options.ttl) {
                info!("Cache hit for {}", key);
                return Ok(ProxiedForecast {
                    document: entry.value.clone(),
                    cache_status: CacheStatus::Hit,
                });
            }
        }

        match self.fetch_upstream(coordinate).await {
            Ok(document) => {
                self.cache.set_at(key, document.clone(), now);
                Ok(ProxiedForecast {
                    document,
                    cache_status: CacheStatus::Miss,
                })
            }
            Err(err) => match cached {
                Some(entry) => {
                    warn!("Returning stale cache for {} due to: {}", key, err);
                    Ok(ProxiedForecast {
                        document: entry.value,
                        cache_status: CacheStatus::Stale,
                    })
                }
                None => Err(err),
            },
        }
    }

    /// Try each endpoint in order; the first valid document wins, otherwise
    /// the failure of the last endpoint is reported.
    async fn fetch_upstream(&self, coordinate: &Coordinate) -> Result<Arc<str>> {
        let mut last_error = SunnyError::unreachable("No upstream endpoints configured");

        for (attempt, endpoint) in self.options.endpoints.iter().enumerate() {
            if attempt > 0 {
                info!("Falling back to endpoint {}", attempt + 1);
            }

            match self
                .upstream
                .fetch_raw(endpoint, *coordinate, self.options.timeout)
                .await
            {
                Ok(response) if !response.is_success() => {
                    warn!("HTTP {} from forecast API", response.status);
                    last_error = SunnyError::upstream_status(response.status);
                }
                Ok(response) if !has_forecast_markers(&response.body) => {
                    warn!("Response does not appear to be a forecast document");
                    last_error =
                        SunnyError::invalid_response("Response does not appear to be valid XML");
                }
                Ok(response) => return Ok(Arc::from(response.body)),
                Err(e) => {
                    warn!("Error fetching from forecast API: {}", e);
                    last_error = SunnyError::unreachable(e.to_string());
                }
            }
        }

        Err(last_error)
    }
}
