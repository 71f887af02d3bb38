//! Resolved location model and derived map view

use serde::{Deserialize, Serialize};

use crate::{Result, WeatherIntelError};

/// Zoom level of the map view attached to every record
pub const DEFAULT_MAP_ZOOM: u8 = 12;

/// A location query turned into a place and coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// City (or first component of the geocoder's display name)
    pub city: String,
    /// Country (last component of the geocoder's display name)
    pub country: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl ResolvedLocation {
    /// Create a location, rejecting coordinates outside the valid ranges
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
        lat: f64,
        lon: f64,
    ) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(WeatherIntelError::resolution(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            )));
        }

        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(WeatherIntelError::resolution(format!(
                "Longitude must be between -180 and 180, got: {lon}"
            )));
        }

        Ok(Self {
            city: city.into(),
            country: country.into(),
            lat,
            lon,
        })
    }

    /// "City, Country"
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Map view centered on the resolved location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapData {
    /// `[lat, lon]`
    pub center: [f64; 2],
    pub zoom: u8,
    pub marker: MapMarker,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapMarker {
    pub lat: f64,
    pub lon: f64,
    pub title: String,
}

impl MapData {
    #[must_use]
    pub fn for_location(location: &ResolvedLocation) -> Self {
        Self {
            center: [location.lat, location.lon],
            zoom: DEFAULT_MAP_ZOOM,
            marker: MapMarker {
                lat: location.lat,
                lon: location.lon,
                title: location.display_name(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_valid_location() {
        let location = ResolvedLocation::new("Paris", "France", 48.8566, 2.3522).unwrap();
        assert_eq!(location.display_name(), "Paris, France");
        assert_eq!(location.format_coordinates(), "48.8566, 2.3522");
    }

    #[rstest]
    #[case(90.1, 0.0)]
    #[case(-90.1, 0.0)]
    #[case(0.0, 180.5)]
    #[case(0.0, -181.0)]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    fn test_invalid_coordinates_are_rejected(#[case] lat: f64, #[case] lon: f64) {
        let result = ResolvedLocation::new("Nowhere", "Nowhere", lat, lon);
        assert!(matches!(result, Err(WeatherIntelError::Resolution { .. })));
    }

    #[rstest]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    fn test_boundary_coordinates_are_accepted(#[case] lat: f64, #[case] lon: f64) {
        assert!(ResolvedLocation::new("Edge", "Earth", lat, lon).is_ok());
    }

    #[test]
    fn test_map_data_follows_location() {
        let location = ResolvedLocation::new("Paris", "France", 48.8566, 2.3522).unwrap();
        let map = MapData::for_location(&location);
        assert_eq!(map.center, [48.8566, 2.3522]);
        assert_eq!(map.zoom, 12);
        assert_eq!(map.marker.title, "Paris, France");
    }
}
