//! Sunshine finder
//!
//! Fans out over candidate locations with a bounded number of concurrent
//! forecast fetches, keeps the ones with a sunny verdict for the requested
//! date and ranks them by distance from the reference point.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures::{StreamExt, stream};
use tracing::{debug, info, instrument, warn};

use crate::distance::distance_km;
use crate::forecast::ForecastParser;
use crate::models::{Coordinate, Location, RankedLocation};
use crate::proxy::ForecastProxy;

pub struct SunshineFinder {
    proxy: Arc<ForecastProxy>,
    concurrency: usize,
}

impl SunshineFinder {
    #[must_use]
    pub fn new(proxy: Arc<ForecastProxy>, concurrency: usize) -> Self {
        Self {
            proxy,
            concurrency: concurrency.max(1),
        }
    }

    /// Candidates that are sunny on `date`, closest to `reference` first.
    ///
    /// A candidate whose forecast cannot be fetched or parsed is left out of
    /// the result; it never fails the whole query.
    #[instrument(skip(self, candidates, now), fields(candidates = candidates.len()))]
    pub async fn find_sunny_locations(
        &self,
        candidates: &[Location],
        date: NaiveDate,
        reference: &Coordinate,
        now: DateTime<Utc>,
    ) -> Vec<RankedLocation> {
        let evaluations: Vec<_> = candidates
            .iter()
            .enumerate()
            .map(|(index, location)| async move {
                self.evaluate(location, date, reference, now)
                    .await
                    .map(|ranked| (index, ranked))
            })
            .collect();
        let mut ranked: Vec<(usize, RankedLocation)> = stream::iter(evaluations)
            .buffer_unordered(self.concurrency)
            .filter_map(|result| async move { result })
            .collect()
            .await;

        ranked.sort_by_key(|(index, location)| (location.distance_km, *index));

        info!(
            "{} of {} locations sunny on {}",
            ranked.len(),
            candidates.len(),
            date
        );
        ranked.into_iter().map(|(_, location)| location).collect()
    }

    async fn evaluate(
        &self,
        location: &Location,
        date: NaiveDate,
        reference: &Coordinate,
        now: DateTime<Utc>,
    ) -> Option<RankedLocation> {
        let forecast = match self.proxy.fetch_forecast(&location.coordinate, now).await {
            Ok(forecast) => forecast,
            Err(e) => {
                warn!("Skipping {}: {}", location.name, e);
                return None;
            }
        };

        let verdict = match ForecastParser::parse(&forecast.document) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Skipping {}: {}", location.name, e);
                return None;
            }
        };

        if verdict.get(&date) != Some(&true) {
            debug!("{} is not sunny on {}", location.name, date);
            return None;
        }

        let km = distance_km(reference, &location.coordinate).round();
        Some(RankedLocation {
            location: location.clone(),
            distance_km: km as u32,
        })
    }
}
