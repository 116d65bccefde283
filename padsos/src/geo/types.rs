//! Coordinate type definitions

use std::fmt;
use thiserror::Error;

/// Valid latitude range in degrees
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range in degrees
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// A geographic position in floating-point degrees.
///
/// Latitude is positive north of the equator, longitude positive east
/// of the prime meridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinates {
    /// Create validated coordinates.
    ///
    /// # Errors
    ///
    /// Returns a [`GeoError`] if either component is non-finite or
    /// outside the valid degree range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let coords = Self {
            latitude,
            longitude,
        };
        coords.validate()?;
        Ok(coords)
    }

    /// Check both components against the valid degree ranges.
    ///
    /// NaN and infinite values are rejected before the range checks so
    /// that a NaN latitude reports as non-finite, not out-of-range.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(GeoError::NotFinite {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(MIN_LAT..=MAX_LAT).contains(&self.latitude) {
            return Err(GeoError::InvalidLatitude(self.latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&self.longitude) {
            return Err(GeoError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Errors for invalid geographic input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// A component is NaN or infinite.
    #[error("coordinate is not finite: ({latitude}, {longitude})")]
    NotFinite { latitude: f64, longitude: f64 },

    /// Latitude outside [-90, 90] degrees.
    #[error("invalid latitude {0} (must be within -90..=90)")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] degrees.
    #[error("invalid longitude {0} (must be within -180..=180)")]
    InvalidLongitude(f64),
}
