//! Static registry of candidate towns

use crate::models::{Coordinate, Location};

/// Reference point used when the caller does not supply one (Dublin)
pub const DEFAULT_REFERENCE: Coordinate = Coordinate {
    latitude: 53.3498,
    longitude: -6.2603,
};

const IRISH_TOWNS: [(&str, f64, f64); 10] = [
    ("Dublin", 53.3498, -6.2603),
    ("Cork", 51.8969, -8.4863),
    ("Limerick", 52.6638, -8.6267),
    ("Galway", 53.2707, -9.0568),
    ("Waterford", 52.2593, -7.1101),
    ("Drogheda", 53.7189, -6.3478),
    ("Dundalk", 54.0000, -6.4167),
    ("Sligo", 54.2697, -8.4694),
    ("Kilkenny", 52.6541, -7.2448),
    ("Wexford", 52.3369, -6.4633),
];

/// The towns searched for sunshine, in registry order
#[must_use]
pub fn irish_locations() -> Vec<Location> {
    IRISH_TOWNS
        .iter()
        .map(|(name, latitude, longitude)| Location::new(*name, *latitude, *longitude))
        .collect()
}
