use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Build a validated coordinate.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        let c = Self { lat, lng };
        c.validate()?;
        Ok(c)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(MapError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Equality within `eps` degrees on both axes.
    pub fn approx_eq(&self, other: &Coordinate, eps: f64) -> bool {
        (self.lat - other.lat).abs() <= eps && (self.lng - other.lng).abs() <= eps
    }
}

impl TryFrom<[f64; 2]> for Coordinate {
    type Error = MapError;

    /// `[lat, lng]`, the order the backend stores locations in.
    fn try_from(pair: [f64; 2]) -> Result<Self> {
        Coordinate::new(pair[0], pair[1])
    }
}

/// What the camera shows. The single source of truth handed to the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
}

impl MapView {
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        Self { center, zoom }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_range_edges() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_and_non_finite() {
        assert_eq!(
            Coordinate::new(90.5, 0.0),
            Err(MapError::InvalidCoordinate { lat: 90.5, lng: 0.0 })
        );
        assert!(Coordinate::new(0.0, -180.01).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn pair_is_lat_then_lng() {
        let c = Coordinate::try_from([28.6139, 77.2090]).unwrap();
        assert_eq!(c.lat, 28.6139);
        assert_eq!(c.lng, 77.2090);
        assert!(Coordinate::try_from([77.2090, 128.6]).is_ok());
        assert!(Coordinate::try_from([128.6, 77.2090]).is_err());
    }

    #[test]
    fn deserialized_coordinates_are_not_trusted() {
        let c: Coordinate = serde_json::from_str(r#"{"lat": 120.0, "lng": 10.0}"#).unwrap();
        assert!(!c.is_valid());
    }
}
