use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{ACCESS_CONTROL_ALLOW_ORIGIN, RETRY_AFTER},
    },
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    SunnyError,
    config::SunnyConfig,
    finder::SunshineFinder,
    models::{Coordinate, Location, RankedLocation},
    proxy::{ForecastProxy, ProxyOptions},
    registry::{DEFAULT_REFERENCE, irish_locations},
    upstream::{MetEireannClient, UpstreamClient},
    warnings::{WarningService, WeatherWarning},
};

pub mod met;

/// Seconds a client should wait before retrying after an upstream failure
pub const RETRY_AFTER_SECONDS: u64 = 60;

/// Source of the current time, replaceable in tests
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Shared state of all handlers
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ForecastProxy>,
    pub finder: Arc<SunshineFinder>,
    pub warnings: Arc<WarningService>,
    pub locations: Arc<Vec<Location>>,
    /// Seconds advertised as `stale-while-revalidate`
    pub stale_while_revalidate: u64,
    clock: Clock,
}

impl AppState {
    #[must_use]
    pub fn new(
        proxy: Arc<ForecastProxy>,
        warnings: Arc<WarningService>,
        concurrency: usize,
        stale_while_revalidate: u64,
    ) -> Self {
        Self {
            finder: Arc::new(SunshineFinder::new(proxy.clone(), concurrency)),
            proxy,
            warnings,
            locations: Arc::new(irish_locations()),
            stale_while_revalidate,
            clock: Arc::new(Utc::now),
        }
    }

    /// Wire up the real upstream clients from configuration
    pub fn from_config(config: &SunnyConfig) -> crate::Result<Self> {
        let upstream: Arc<dyn UpstreamClient> = Arc::new(MetEireannClient::new(
            &config.proxy.user_agent,
            config.proxy.max_retries,
        )?);
        let proxy = Arc::new(ForecastProxy::with_fresh_cache(
            upstream,
            ProxyOptions::from(&config.proxy),
        ));
        let warnings = Arc::new(WarningService::new(
            &config.warnings,
            Duration::from_secs(config.proxy.timeout_seconds),
        )?);

        Ok(Self::new(
            proxy,
            warnings,
            config.finder.concurrency,
            config.server.stale_while_revalidate_seconds,
        ))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

/// Error returned by handlers, rendered as a JSON body
#[derive(Debug)]
pub struct ApiError(pub SunnyError);

impl From<SunnyError> for ApiError {
    fn from(error: SunnyError) -> Self {
        Self(error)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            SunnyError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            SunnyError::UpstreamUnavailable {
                status: Some(status),
                ..
            } => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            SunnyError::UpstreamUnavailable { status: None, .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SunnyError::UpstreamInvalidResponse { .. }
            | SunnyError::MalformedDocument { .. }
            | SunnyError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self.0 {
            SunnyError::InvalidRequest { message } => json!({ "error": message }),
            SunnyError::UpstreamUnavailable { cause, .. } => json!({
                "error": "Failed to fetch Met Éireann data",
                "details": cause,
                "message": self.0.user_message(),
                "retryable": true,
            }),
            SunnyError::UpstreamInvalidResponse { message } => json!({
                "error": "Invalid response from Met Éireann",
                "details": message,
                "message": self.0.user_message(),
                "retryable": true,
            }),
            SunnyError::MalformedDocument { message } | SunnyError::Config { message } => {
                error!("Unexpected error: {}", self.0);
                json!({
                    "error": "Internal server error",
                    "details": message,
                    "message": self.0.user_message(),
                })
            }
        };

        let mut response = (status, Json(body)).into_response();
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        if self.0.is_retryable() {
            headers.insert(RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECONDS));
        }
        response
    }
}

#[derive(Serialize, Deserialize)]
pub struct ApiLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Location> for ApiLocation {
    fn from(location: &Location) -> Self {
        Self {
            name: location.name.clone(),
            latitude: location.coordinate.latitude,
            longitude: location.coordinate.longitude,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ApiRankedLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: u32,
}

impl From<RankedLocation> for ApiRankedLocation {
    fn from(ranked: RankedLocation) -> Self {
        Self {
            name: ranked.location.name,
            latitude: ranked.location.coordinate.latitude,
            longitude: ranked.location.coordinate.longitude,
            distance_km: ranked.distance_km,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct SunnyResponse {
    pub date: NaiveDate,
    pub reference: Coordinate,
    pub locations: Vec<ApiRankedLocation>,
    pub warnings: Vec<WeatherWarning>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DayOption {
    pub date: NaiveDate,
    pub label: String,
}

#[derive(Deserialize)]
pub struct SunnyQuery {
    pub date: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sunny", get(get_sunny))
        .route("/days", get(get_days))
        .route("/locations", get(get_locations))
        .route("/warnings", get(get_warnings))
}

/// Treat empty query values as absent
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(date: Option<String>, today: NaiveDate) -> Result<NaiveDate, SunnyError> {
    match present(date) {
        None => Ok(today),
        Some(date) => NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| SunnyError::invalid_request(format!("Invalid date: {date}"))),
    }
}

fn parse_reference(lat: Option<String>, lon: Option<String>) -> Result<Coordinate, SunnyError> {
    match (present(lat), present(lon)) {
        (None, None) => Ok(DEFAULT_REFERENCE),
        (Some(lat), Some(lon)) => Coordinate::parse(&lat, &lon),
        _ => Err(SunnyError::invalid_request("Missing lat or lon")),
    }
}

/// The next seven calendar dates starting at `today`
#[must_use]
pub fn next_seven_days(today: NaiveDate) -> Vec<DayOption> {
    (0..7)
        .map(|offset| {
            let date = today + TimeDelta::days(offset);
            let label = match offset {
                0 => "Today".to_string(),
                1 => "Tomorrow".to_string(),
                _ => date.format("%a, %b %-d").to_string(),
            };
            DayOption { date, label }
        })
        .collect()
}

async fn get_sunny(
    State(state): State<AppState>,
    Query(query): Query<SunnyQuery>,
) -> Result<Json<SunnyResponse>, ApiError> {
    let now = state.now();
    let date = parse_date(query.date, now.date_naive())?;
    let reference = parse_reference(query.lat, query.lon)?;

    let (ranked, warnings) = tokio::join!(
        state
            .finder
            .find_sunny_locations(&state.locations, date, &reference, now),
        state.warnings.current(now),
    );

    info!(
        "Found {} sunny locations for {} near {:.4}, {:.4}",
        ranked.len(),
        date,
        reference.latitude,
        reference.longitude
    );

    Ok(Json(SunnyResponse {
        date,
        reference,
        locations: ranked.into_iter().map(ApiRankedLocation::from).collect(),
        warnings: (*warnings).clone(),
    }))
}

async fn get_days(State(state): State<AppState>) -> Json<Vec<DayOption>> {
    Json(next_seven_days(state.now().date_naive()))
}

async fn get_locations(State(state): State<AppState>) -> Json<Vec<ApiLocation>> {
    Json(state.locations.iter().map(ApiLocation::from).collect())
}

async fn get_warnings(State(state): State<AppState>) -> Json<Vec<WeatherWarning>> {
    let warnings = state.warnings.current(state.now()).await;
    Json((*warnings).clone())
}
