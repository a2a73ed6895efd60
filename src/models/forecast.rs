//! Forecast aggregation models

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Location;

/// One forecast period extracted from a provider document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastSample {
    /// Calendar date in the document's own time zone
    pub date: NaiveDate,
    /// Provider weather symbol, `None` when absent or unreadable
    pub symbol: Option<i32>,
}

/// Sunny verdict per calendar date
pub type DailyVerdict = BTreeMap<NaiveDate, bool>;

/// A sunny location together with its distance from the reference point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLocation {
    pub location: Location,
    /// Great-circle distance rounded to whole kilometres
    pub distance_km: u32,
}
