//! Location models: raw place queries, coordinates and geocoding results

use std::fmt;

use serde::{Deserialize, Serialize};

/// Geographic coordinates in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude, always within [-90, 90]
    pub latitude: f64,
    /// Longitude, always within [-180, 180]
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside the valid ranges
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Format as "lat,lon" with two decimal places (map link precision)
    #[must_use]
    pub fn format_short(&self) -> String {
        format!("{:.2},{:.2}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Place name exactly as extracted from the user's message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery(String);

impl LocationQuery {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First candidate returned by the geocoding provider for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub query: LocationQuery,
    pub coordinate: Coordinate,
    /// Display label the provider matched, e.g. "Lagos, Lagos State, Nigeria"
    pub matched_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_range_checks() {
        assert!(Coordinate::new(6.45, 3.39).is_some());
        assert!(Coordinate::new(90.0, -180.0).is_some());
        assert!(Coordinate::new(90.1, 0.0).is_none());
        assert!(Coordinate::new(0.0, 180.5).is_none());
        assert!(Coordinate::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_coordinate_short_format() {
        let coordinate = Coordinate::new(6.455_057, 3.394_179).unwrap();
        assert_eq!(coordinate.format_short(), "6.46,3.39");
    }
}
