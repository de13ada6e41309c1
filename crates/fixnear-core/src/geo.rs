//! Geographic value types shared by the directory, matcher, and API layers.

use serde::{Deserialize, Serialize};

use crate::CoreError;

const METERS_PER_KM: f64 = 1_000.0;

/// A validated (latitude, longitude) pair in decimal degrees.
///
/// Construction rejects non-finite components and anything outside
/// `[-90, 90]` × `[-180, 180]`, so every `Coordinate` in the system is safe
/// to feed into trigonometric distance code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateRepr", into = "CoordinateRepr")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CoordinateRepr {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] if either component is NaN,
    /// infinite, or out of range.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(CoreError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Longitude-first pair, the GeoJSON `coordinates` ordering.
    #[must_use]
    pub fn lng_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

impl TryFrom<CoordinateRepr> for Coordinate {
    type Error = CoreError;

    fn try_from(repr: CoordinateRepr) -> Result<Self, Self::Error> {
        Self::try_new(repr.latitude, repr.longitude)
    }
}

impl From<Coordinate> for CoordinateRepr {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// A non-negative great-circle distance, stored internally in meters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Distance {
    meters: f64,
}

impl Distance {
    pub const ZERO: Self = Self { meters: 0.0 };

    #[must_use]
    pub fn from_meters(meters: f64) -> Self {
        Self { meters }
    }

    #[must_use]
    pub fn from_km(km: f64) -> Self {
        Self {
            meters: km * METERS_PER_KM,
        }
    }

    #[must_use]
    pub fn meters(&self) -> f64 {
        self.meters
    }

    #[must_use]
    pub fn km(&self) -> f64 {
        self.meters / METERS_PER_KM
    }
}
