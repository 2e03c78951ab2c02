//! Coordinates, great-circle distance, and bounding boxes.

pub mod locator;

use serde::{Deserialize, Serialize};

pub use locator::{
    CachePolicy, FixedLocationProvider, GeolocationError, Geolocator, LocationProvider,
};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),
}

/// A WGS84 point. Both components are always present and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a coordinate only when both halves are present and valid.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::try_new(lat, lon).ok(),
            _ => None,
        }
    }

    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        distance_km(*self, *other)
    }
}

/// Great-circle distance between two points on a sphere of radius 6371 km.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // rounding can push h a hair above 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    (EARTH_RADIUS_KM * c).max(0.0)
}

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Smallest box containing every coordinate; `None` for an empty input.
    pub fn enclosing<I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        coordinates.into_iter().fold(None, |acc, point| {
            Some(match acc {
                None => Self {
                    south: point.latitude,
                    west: point.longitude,
                    north: point.latitude,
                    east: point.longitude,
                },
                Some(bounds) => Self {
                    south: bounds.south.min(point.latitude),
                    west: bounds.west.min(point.longitude),
                    north: bounds.north.max(point.latitude),
                    east: bounds.east.max(point.longitude),
                },
            })
        })
    }

    pub fn center(&self) -> Coordinate {
        Coordinate {
            latitude: (self.south + self.north) / 2.0,
            longitude: (self.west + self.east) / 2.0,
        }
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        point.latitude >= self.south
            && point.latitude <= self.north
            && point.longitude >= self.west
            && point.longitude <= self.east
    }
}
