//! Configuration management for the sunshine service
//!
//! Handles loading configuration from an optional TOML file and environment
//! variables, and provides validation for all configuration settings.

use crate::SunnyError;
use crate::proxy::MET_EIREANN_ENDPOINT;
use crate::registry::irish_locations;
use crate::warnings::MET_EIREANN_WARNINGS_URL;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "SUNNY_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SunnyConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Forecast proxy configuration
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Sunshine finder configuration
    #[serde(default)]
    pub finder: FinderConfig,
    /// Weather warnings configuration
    #[serde(default)]
    pub warnings: WarningsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `stale-while-revalidate` advertised to downstream caches
    #[serde(default = "default_stale_while_revalidate")]
    pub stale_while_revalidate_seconds: u64,
    /// Upper bound for handling a single request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Directory with a static frontend to serve, if any
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

/// Forecast proxy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Freshness window of a cached forecast
    #[serde(default = "default_proxy_ttl")]
    pub ttl_seconds: u32,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Entries removed when the cache overflows
    #[serde(default = "default_evict_count")]
    pub evict_count: usize,
    /// Bound on a single upstream request
    #[serde(default = "default_proxy_timeout")]
    pub timeout_seconds: u64,
    /// Retries of transient upstream failures within the timeout
    #[serde(default)]
    pub max_retries: u32,
    /// Upstream URL templates with `{lat}` and `{lon}` placeholders, tried in order
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    /// Decimal places kept when building cache keys
    #[serde(default)]
    pub rounding_precision: Option<u32>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Sunshine finder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Forecast fetches in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// Weather warnings feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_warnings_url")]
    pub url: String,
    #[serde(default = "default_warnings_ttl")]
    pub ttl_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_stale_while_revalidate() -> u64 {
    3600
}

fn default_request_timeout() -> u64 {
    60
}

fn default_proxy_ttl() -> u32 {
    3 * 60 * 60
}

fn default_max_entries() -> usize {
    200
}

fn default_evict_count() -> usize {
    50
}

fn default_proxy_timeout() -> u64 {
    15
}

fn default_endpoints() -> Vec<String> {
    vec![MET_EIREANN_ENDPOINT.to_string()]
}

fn default_user_agent() -> String {
    format!("IsSunny/{}", crate::VERSION)
}

fn default_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_warnings_url() -> String {
    MET_EIREANN_WARNINGS_URL.to_string()
}

fn default_warnings_ttl() -> u32 {
    30 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            stale_while_revalidate_seconds: default_stale_while_revalidate(),
            request_timeout_seconds: default_request_timeout(),
            static_dir: None,
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_proxy_ttl(),
            max_entries: default_max_entries(),
            evict_count: default_evict_count(),
            timeout_seconds: default_proxy_timeout(),
            max_retries: 0,
            endpoints: default_endpoints(),
            rounding_precision: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl Default for WarningsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_warnings_url(),
            ttl_seconds: default_warnings_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl SunnyConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Explicit path, then $SUNNY_CONFIG, then ./config.toml
        let config_file = config_path.unwrap_or_else(Self::get_config_path);

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. SUNNY_PROXY__TIMEOUT_SECONDS=10
        builder = builder.add_source(
            Environment::with_prefix("SUNNY")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("proxy.endpoints")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SunnyConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn get_config_path() -> PathBuf {
        env::var_os(CONFIG_PATH_ENV).map_or_else(|| PathBuf::from("config.toml"), PathBuf::from)
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.proxy.user_agent.is_empty() {
            self.proxy.user_agent = default_user_agent();
        }
        if self.warnings.url.is_empty() {
            self.warnings.url = default_warnings_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        self.logging.level = self.logging.level.to_lowercase();
        self.logging.format = self.logging.format.to_lowercase();
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_endpoints()?;
        self.validate_time_budget()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Worst case for one sunshine query: every candidate wave waits out
    /// the upstream timeout on every endpoint
    #[must_use]
    pub fn worst_case_upstream_seconds(&self) -> u64 {
        let waves = irish_locations()
            .len()
            .div_ceil(self.finder.concurrency.max(1));
        self.proxy.timeout_seconds * (self.proxy.endpoints.len() * waves) as u64
    }

    /// The request timeout must outlast the upstream fallback chain, or the
    /// router cuts requests off before a stale copy can be served
    fn validate_time_budget(&self) -> Result<()> {
        let needed = self.worst_case_upstream_seconds();
        if self.server.request_timeout_seconds <= needed {
            return Err(SunnyError::config(format!(
                "Request timeout ({}s) must exceed the worst-case upstream time ({needed}s); \
                 raise server.request_timeout_seconds or lower proxy.timeout_seconds",
                self.server.request_timeout_seconds
            ))
            .into());
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if !(1..=60).contains(&self.proxy.timeout_seconds) {
            return Err(
                SunnyError::config("Upstream timeout must be between 1 and 60 seconds").into(),
            );
        }

        if self.proxy.ttl_seconds == 0 {
            return Err(SunnyError::config("Forecast cache TTL must be greater than 0").into());
        }

        if self.proxy.max_entries == 0 {
            return Err(SunnyError::config("Cache max entries must be greater than 0").into());
        }

        if self.proxy.evict_count == 0 || self.proxy.evict_count >= self.proxy.max_entries {
            return Err(SunnyError::config(format!(
                "Cache evict count must be between 1 and {} (below max entries)",
                self.proxy.max_entries.saturating_sub(1)
            ))
            .into());
        }

        if self.proxy.rounding_precision.is_some_and(|p| p > 6) {
            return Err(SunnyError::config("Rounding precision cannot exceed 6 decimals").into());
        }

        if !(1..=32).contains(&self.finder.concurrency) {
            return Err(SunnyError::config("Finder concurrency must be between 1 and 32").into());
        }

        if self.warnings.enabled && self.warnings.ttl_seconds == 0 {
            return Err(SunnyError::config("Warnings TTL must be greater than 0").into());
        }

        Ok(())
    }

    /// Validate upstream endpoint templates
    fn validate_endpoints(&self) -> Result<()> {
        if self.proxy.endpoints.is_empty() {
            return Err(SunnyError::config("At least one upstream endpoint is required").into());
        }

        for endpoint in &self.proxy.endpoints {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(SunnyError::config(format!(
                    "Upstream endpoint must be a valid HTTP or HTTPS URL: {endpoint}"
                ))
                .into());
            }
            if !endpoint.contains("{lat}") || !endpoint.contains("{lon}") {
                return Err(SunnyError::config(format!(
                    "Upstream endpoint must contain {{lat}} and {{lon}} placeholders: {endpoint}"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SunnyError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SunnyError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if self.warnings.enabled
            && !self.warnings.url.starts_with("http://")
            && !self.warnings.url.starts_with("https://")
        {
            return Err(
                SunnyError::config("Warnings feed URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = SunnyConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.stale_while_revalidate_seconds, 3600);
        assert_eq!(config.proxy.ttl_seconds, 10800);
        assert_eq!(config.proxy.max_entries, 200);
        assert_eq!(config.proxy.evict_count, 50);
        assert_eq!(config.proxy.timeout_seconds, 15);
        assert_eq!(config.proxy.endpoints, vec![MET_EIREANN_ENDPOINT.to_string()]);
        assert!(config.proxy.rounding_precision.is_none());
        assert_eq!(config.finder.concurrency, 4);
        assert!(config.warnings.enabled);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
[server]
port = 8080
request_timeout_seconds = 90

[proxy]
timeout_seconds = 10
rounding_precision = 2
endpoints = [
    "https://primary.example/forecast?lat={lat}&lon={lon}",
    "http://openaccess.pf.api.met.ie/metno-wdb2ts/locationforecast?lat={lat};long={lon}",
]

[logging]
format = "JSON"
"#,
        );

        let config = SunnyConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.request_timeout_seconds, 90);
        assert_eq!(config.proxy.timeout_seconds, 10);
        assert_eq!(config.proxy.rounding_precision, Some(2));
        assert_eq!(config.proxy.endpoints.len(), 2);
        assert_eq!(config.proxy.max_entries, 200);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            SunnyConfig::load_from_path(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.proxy.ttl_seconds, 10800);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let file = write_config("[proxy]\nevict_count = 500\n");
        let err = SunnyConfig::load_from_path(Some(file.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("evict count"));
    }

    #[test]
    fn test_environment_variable_override() {
        // SAFETY: Test environment, the variable is unique to this test
        unsafe {
            env::set_var("SUNNY_FINDER__CONCURRENCY", "8");
        }

        let dir = tempfile::tempdir().unwrap();
        let result = SunnyConfig::load_from_path(Some(dir.path().join("absent.toml")));

        // SAFETY: Test cleanup
        unsafe {
            env::remove_var("SUNNY_FINDER__CONCURRENCY");
        }

        assert_eq!(result.unwrap().finder.concurrency, 8);
    }

    #[test]
    fn test_validation_timeout_range() {
        let mut config = SunnyConfig::default();
        config.proxy.timeout_seconds = 0;
        assert!(config.validate().is_err());

        config.proxy.timeout_seconds = 61;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout"));
    }

    #[test]
    fn test_validation_eviction() {
        let mut config = SunnyConfig::default();
        config.proxy.evict_count = 0;
        assert!(config.validate().is_err());

        config.proxy.evict_count = 200;
        assert!(config.validate().is_err());

        config.proxy.evict_count = 199;
        assert!(config.validate().is_ok());

        config.proxy.max_entries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_endpoints() {
        let mut config = SunnyConfig::default();
        config.proxy.endpoints.clear();
        assert!(config.validate().is_err());

        config.proxy.endpoints = vec!["ftp://met.ie/?lat={lat}&lon={lon}".into()];
        assert!(config.validate().is_err());

        config.proxy.endpoints = vec!["https://met.ie/forecast?lat=53&lon=-6".into()];
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("placeholders"));
    }

    #[test]
    fn test_validation_rounding_and_concurrency() {
        let mut config = SunnyConfig::default();
        config.proxy.rounding_precision = Some(7);
        assert!(config.validate().is_err());

        config.proxy.rounding_precision = Some(2);
        config.finder.concurrency = 0;
        assert!(config.validate().is_err());

        config.finder.concurrency = 32;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_time_budget() {
        let mut config = SunnyConfig::default();
        // 10 towns at concurrency 4 is 3 waves of 15s
        assert_eq!(config.worst_case_upstream_seconds(), 45);
        assert!(config.validate().is_ok());

        config.proxy.endpoints = vec![
            "https://a.example/forecast?lat={lat}&long={lon}".to_string(),
            "https://b.example/forecast?lat={lat}&long={lon}".to_string(),
        ];
        assert_eq!(config.worst_case_upstream_seconds(), 90);
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Request timeout"));

        config.server.request_timeout_seconds = 91;
        assert!(config.validate().is_ok());

        config.server.request_timeout_seconds = 60;
        config.finder.concurrency = 10;
        assert_eq!(config.worst_case_upstream_seconds(), 30);
        assert!(config.validate().is_ok());

        config.proxy.timeout_seconds = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = SunnyConfig::default();
        config.logging.level = "verbose".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_apply_defaults() {
        let mut config = SunnyConfig::default();
        config.server.host.clear();
        config.logging.level = "DEBUG".into();
        config.apply_defaults();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "debug");
    }
}
