//! Met Éireann weather warnings
//!
//! Advisories are shown next to the sunshine results. They are best effort:
//! any failure yields the last known list, or nothing.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache::CacheStore;
use crate::config::WarningsConfig;
use crate::{Result, SunnyError};

pub const MET_EIREANN_WARNINGS_URL: &str = "https://www.met.ie/Open_Data/json/warning_EIXX.json";

const DEFAULT_DESCRIPTION: &str = "Weather warning active";

/// A single active advisory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherWarning {
    pub description: String,
    pub headline: Option<String>,
    pub level: Option<String>,
    pub onset: Option<String>,
    pub expiry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawWarning {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    onset: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
}

impl From<RawWarning> for WeatherWarning {
    fn from(raw: RawWarning) -> Self {
        Self {
            description: raw
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            headline: raw.headline,
            level: raw.level,
            onset: raw.onset,
            expiry: raw.expiry,
        }
    }
}

/// The feed is either a bare list or an object wrapping one
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WarningFeed {
    List(Vec<RawWarning>),
    Wrapped {
        #[serde(default)]
        warnings: Vec<RawWarning>,
    },
}

/// Parse the warnings feed body
pub fn parse_feed(body: &str) -> Result<Vec<WeatherWarning>> {
    let feed: WarningFeed = serde_json::from_str(body)
        .map_err(|e| SunnyError::invalid_response(format!("Invalid warnings feed: {e}")))?;
    let raw = match feed {
        WarningFeed::List(warnings) | WarningFeed::Wrapped { warnings } => warnings,
    };
    Ok(raw.into_iter().map(WeatherWarning::from).collect())
}

pub struct WarningService {
    // `None` when warnings are disabled
    client: Option<reqwest::Client>,
    url: String,
    ttl: TimeDelta,
    cache: CacheStore<String, Arc<Vec<WeatherWarning>>>,
}

impl WarningService {
    pub fn new(config: &WarningsConfig, timeout: Duration) -> Result<Self> {
        let client = if config.enabled {
            Some(
                reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| {
                        SunnyError::config(format!("Failed to create HTTP client: {e}"))
                    })?,
            )
        } else {
            None
        };

        Ok(Self {
            client,
            url: config.url.clone(),
            ttl: TimeDelta::seconds(i64::from(config.ttl_seconds)),
            cache: CacheStore::new(1, 1),
        })
    }

    /// A service that never reports any warnings
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            client: None,
            url: String::new(),
            ttl: TimeDelta::zero(),
            cache: CacheStore::new(1, 1),
        }
    }

    /// Active warnings as of `now`
    #[instrument(skip(self, now))]
    pub async fn current(&self, now: DateTime<Utc>) -> Arc<Vec<WeatherWarning>> {
        let Some(client) = &self.client else {
            return Arc::default();
        };

        let cached = self.cache.get(&self.url);
        if let Some(entry) = &cached {
            if entry.is_fresh(now, self.ttl) {
                return entry.value.clone();
            }
        }

        match self.fetch(client).await {
            Ok(warnings) => {
                debug!("Fetched {} weather warnings", warnings.len());
                let warnings = Arc::new(warnings);
                self.cache.set_at(self.url.clone(), warnings.clone(), now);
                warnings
            }
            Err(e) => {
                warn!("Error fetching warnings: {}", e);
                cached.map(|entry| entry.value).unwrap_or_default()
            }
        }
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<WeatherWarning>> {
        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SunnyError::unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SunnyError::upstream_status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SunnyError::unreachable(e.to_string()))?;
        parse_feed(&body)
    }
}
