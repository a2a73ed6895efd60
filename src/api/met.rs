//! `/met` forecast proxy endpoint

use axum::{
    Router,
    extract::{Query, State},
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE,
        },
    },
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::info;

use super::{ApiError, AppState, present};
use crate::SunnyError;
use crate::models::Coordinate;
use crate::proxy::CacheStatus;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

#[derive(Deserialize)]
pub struct MetQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/met", get(get_forecast).options(preflight))
}

async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<MetQuery>,
) -> Result<Response, ApiError> {
    let (Some(lat), Some(lon)) = (present(query.lat), present(query.lon)) else {
        return Err(SunnyError::invalid_request("Missing lat or lon").into());
    };
    let coordinate = Coordinate::parse(&lat, &lon)?;

    let forecast = state.proxy.fetch_forecast(&coordinate, state.now()).await?;
    info!(
        "{} {},{}",
        forecast.cache_status.as_str(),
        coordinate.latitude,
        coordinate.longitude
    );

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        X_CACHE,
        HeaderValue::from_static(forecast.cache_status.as_str()),
    );

    // stale copies are never advertised as cacheable
    if forecast.cache_status != CacheStatus::Stale {
        let cache_control = format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            state.proxy.options().ttl.num_seconds(),
            state.stale_while_revalidate
        );
        if let Ok(value) = HeaderValue::from_str(&cache_control) {
            headers.insert(CACHE_CONTROL, value);
        }
    }

    Ok((StatusCode::OK, headers, forecast.document.to_string()).into_response())
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}
