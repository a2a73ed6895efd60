//! Location model for geographic coordinates and cache keys

use serde::{Deserialize, Serialize};

use crate::{Result, SunnyError};

/// A point on the globe in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees, -90..=90
    pub latitude: f64,
    /// Longitude in decimal degrees, -180..=180
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside the valid ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(SunnyError::invalid_request(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(SunnyError::invalid_request(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse a coordinate from raw query parameter text
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self> {
        let lat = latitude
            .trim()
            .parse::<f64>()
            .map_err(|_| SunnyError::invalid_request(format!("Invalid latitude: {latitude}")))?;
        let lon = longitude
            .trim()
            .parse::<f64>()
            .map_err(|_| SunnyError::invalid_request(format!("Invalid longitude: {longitude}")))?;
        Self::new(lat, lon)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(6));
        // `+ 0.0` folds -0.0 into 0.0 so both signs share a key
        let lat = (self.latitude * multiplier).round() / multiplier + 0.0;
        let lon = (self.longitude * multiplier).round() / multiplier + 0.0;
        (lat, lon)
    }

    /// Generate the forecast cache key for this coordinate.
    ///
    /// Without a precision the key uses the coordinate as given, so near-duplicate
    /// requests for the same town are cached separately.
    #[must_use]
    pub fn cache_key(&self, precision: Option<u32>) -> String {
        match precision {
            Some(precision) => {
                let (lat, lon) = self.rounded(precision);
                let digits = precision as usize;
                format!("{lat:.digits$}_{lon:.digits$}")
            }
            None => format!("{}_{}", self.latitude, self.longitude),
        }
    }
}

/// A named place from the location registry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Town or city name
    pub name: String,
    pub coordinate: Coordinate,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            coordinate: Coordinate {
                latitude,
                longitude,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_rounded() {
        let coordinate = Coordinate::new(53.3498, -6.2603).unwrap();
        assert_eq!(coordinate.cache_key(Some(2)), "53.35_-6.26");
    }

    #[test]
    fn test_cache_key_unrounded() {
        let coordinate = Coordinate::new(53.35, -6.26).unwrap();
        assert_eq!(coordinate.cache_key(None), "53.35_-6.26");

        let other = Coordinate::new(53.3498, -6.2603).unwrap();
        assert_ne!(coordinate.cache_key(None), other.cache_key(None));
    }

    #[test]
    fn test_rounding_merges_near_duplicates() {
        let a = Coordinate::new(53.3498, -6.2603).unwrap();
        let b = Coordinate::new(53.3501, -6.2599).unwrap();
        assert_eq!(a.cache_key(Some(2)), b.cache_key(Some(2)));
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
        assert!(Coordinate::new(0.0, -181.0).is_err());
    }

    #[test]
    fn test_parse() {
        let coordinate = Coordinate::parse("53.35", " -6.26").unwrap();
        assert_eq!(coordinate.latitude, 53.35);
        assert_eq!(coordinate.longitude, -6.26);

        assert!(matches!(
            Coordinate::parse("north", "-6.26"),
            Err(SunnyError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_rounded_key_ignores_sign_of_zero() {
        let below = Coordinate::new(-0.001, -0.004).unwrap();
        let above = Coordinate::new(0.001, 0.004).unwrap();
        assert_eq!(below.cache_key(Some(2)), "0.00_0.00");
        assert_eq!(below.cache_key(Some(2)), above.cache_key(Some(2)));
    }
}
