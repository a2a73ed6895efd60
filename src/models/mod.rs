//! Data models for the sunshine service
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates, named places and cache keys
//! - Forecast: Per-period samples, daily verdicts and ranked results

pub mod forecast;
pub mod location;

// Re-export all public types for convenient access
pub use forecast::{DailyVerdict, ForecastSample, RankedLocation};
pub use location::{Coordinate, Location};
