//! Met Éireann forecast document parsing
//!
//! Turns a `locationforecast` XML document into a per-day sunny verdict.
//! Every `<time>` period counts as one sample; periods without a readable
//! symbol count as not sunny.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::models::{DailyVerdict, ForecastSample};
use crate::symbol;
use crate::{Result, SunnyError};

/// Forecast document parser
pub struct ForecastParser;

/// Document structure for deserialization
#[derive(Debug, Deserialize)]
struct WeatherDataXml {
    #[serde(default)]
    product: Vec<ProductXml>,
}

#[derive(Debug, Deserialize)]
struct ProductXml {
    #[serde(rename = "time", default)]
    times: Vec<TimeXml>,
}

#[derive(Debug, Deserialize)]
struct TimeXml {
    #[serde(rename = "@from")]
    from: Option<String>,
    location: Option<LocationXml>,
}

#[derive(Debug, Deserialize)]
struct LocationXml {
    symbol: Option<SymbolXml>,
}

#[derive(Debug, Deserialize)]
struct SymbolXml {
    #[serde(rename = "@number")]
    number: Option<String>,
}

impl TimeXml {
    /// Date part of the `from` timestamp, taken as written
    fn date(&self) -> Option<NaiveDate> {
        let from = self.from.as_deref()?;
        let day = from.split('T').next()?;
        NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d").ok()
    }

    fn symbol(&self) -> Option<i32> {
        self.location
            .as_ref()?
            .symbol
            .as_ref()?
            .number
            .as_deref()?
            .trim()
            .parse()
            .ok()
    }
}

/// Cheap check that a response body looks like a forecast document at all
#[must_use]
pub fn has_forecast_markers(body: &str) -> bool {
    body.contains("<?xml") || body.contains("<weatherdata")
}

impl ForecastParser {
    /// Parse a raw document into a sunny verdict per calendar date
    pub fn parse(document: &str) -> Result<DailyVerdict> {
        let samples = Self::extract_samples(document)?;
        let verdict = Self::aggregate(&samples);
        debug!(
            "Parsed {} samples into {} daily verdicts",
            samples.len(),
            verdict.len()
        );
        Ok(verdict)
    }

    /// Extract every dated forecast period from the document
    pub fn extract_samples(document: &str) -> Result<Vec<ForecastSample>> {
        let parsed: WeatherDataXml = from_str(document)
            .map_err(|e| SunnyError::malformed(format!("Failed to parse forecast XML: {e}")))?;

        let mut samples = Vec::new();
        let mut undated = 0;

        for time in parsed.product.iter().flat_map(|p| p.times.iter()) {
            let Some(date) = time.date() else {
                undated += 1;
                continue;
            };
            let code = time.symbol();
            trace!(
                "{} symbol {:?} ({})",
                date,
                code,
                code.map_or("missing", symbol::describe)
            );
            samples.push(ForecastSample { date, symbol: code });
        }

        if undated > 0 {
            debug!("Skipped {} forecast periods without a readable date", undated);
        }

        if samples.is_empty() {
            return Err(SunnyError::malformed(
                "No time series found in forecast document",
            ));
        }

        Ok(samples)
    }

    /// Sunny iff at least half of a date's samples have a fair symbol
    #[must_use]
    pub fn aggregate(samples: &[ForecastSample]) -> DailyVerdict {
        let mut counts: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();

        for sample in samples {
            let (sunny, total) = counts.entry(sample.date).or_default();
            if sample.symbol.is_some_and(symbol::classify) {
                *sunny += 1;
            }
            *total += 1;
        }

        counts
            .into_iter()
            .map(|(date, (sunny, total))| (date, sunny * 2 >= total))
            .collect()
    }
}
