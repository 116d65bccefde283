//! Geographic distance math
//!
//! Provides great-circle distance between two coordinate pairs using the
//! haversine formula. This is the only math the ranking layer needs: at the
//! scale of co-located participants (a few kilometres) the spherical-earth
//! approximation is well inside GPS error.

mod types;

pub use types::{Coordinates, GeoError, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Mean Earth radius in kilometres, as used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Computes the great-circle distance between two points in kilometres.
///
/// Pure and symmetric: `distance_km(a, b) == distance_km(b, a)` within
/// floating-point tolerance, and identical points yield exactly 0.
///
/// # Errors
///
/// Returns a [`GeoError`] if either input is non-finite or out of range.
pub fn distance_km(a: Coordinates, b: Coordinates) -> Result<f64, GeoError> {
    a.validate()?;
    b.validate()?;

    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat_a.cos() * lat_b.cos();
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Ok(EARTH_RADIUS_KM * c)
}
