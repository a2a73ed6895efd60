//! Forecast provider client
//!
//! The proxy only talks to the provider through [`UpstreamClient`], so tests
//! and alternative transports can stand in for the real HTTP client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::models::Coordinate;
use crate::{Result, SunnyError};

/// Raw provider answer, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any response from the provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetch the raw forecast document for `coordinate` from `endpoint`.
    ///
    /// Must resolve within `timeout`; a slow provider is reported as
    /// [`NetworkError::Timeout`].
    async fn fetch_raw(
        &self,
        endpoint: &str,
        coordinate: Coordinate,
        timeout: Duration,
    ) -> std::result::Result<UpstreamResponse, NetworkError>;
}

/// Fill the `{lat}` and `{lon}` placeholders of an endpoint template
#[must_use]
pub fn endpoint_url(template: &str, coordinate: &Coordinate) -> String {
    template
        .replace("{lat}", &coordinate.latitude.to_string())
        .replace("{lon}", &coordinate.longitude.to_string())
}

/// HTTP client for the Met Éireann open data API
pub struct MetEireannClient {
    client: ClientWithMiddleware,
}

impl MetEireannClient {
    /// Create a new client retrying transient failures up to `max_retries` times
    pub fn new(user_agent: &str, max_retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| SunnyError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for MetEireannClient {
    #[instrument(name = "fetch_upstream", level = "debug", skip(self))]
    async fn fetch_raw(
        &self,
        endpoint: &str,
        coordinate: Coordinate,
        timeout: Duration,
    ) -> std::result::Result<UpstreamResponse, NetworkError> {
        let url = endpoint_url(endpoint, &coordinate);
        debug!("Fetching forecast from {}", url);
        let start_time = Instant::now();

        let request = async {
            let response = self
                .client
                .get(&url)
                .header(ACCEPT, "application/xml, text/xml, */*")
                .send()
                .await
                .map_err(|e| NetworkError::Transport(e.to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| NetworkError::Transport(e.to_string()))?;
            Ok::<_, NetworkError>(UpstreamResponse { status, body })
        };

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => {
                let elapsed = start_time.elapsed();
                if elapsed.as_secs() > 5 {
                    warn!("Slow forecast API response: {:.3}s", elapsed.as_secs_f64());
                }
                result
            }
            Err(_) => Err(NetworkError::Timeout(timeout)),
        }
    }
}
