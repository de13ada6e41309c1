//! Great-circle distance between two coordinates.
//!
//! Every distance the matcher reports comes from [`haversine`]; the geo index
//! and both search modes share it so unit and boundary semantics live here
//! only.

use std::cmp::Ordering;

use fixnear_core::{Coordinate, CoreError, Distance};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Haversine distance between two validated coordinates.
///
/// The arguments are put into a canonical order before evaluating, so
/// `haversine(a, b)` and `haversine(b, a)` are bit-identical. Identical
/// points yield exactly zero.
#[must_use]
pub fn haversine(a: Coordinate, b: Coordinate) -> Distance {
    let (p, q) = if canonical_cmp(a, b) == Ordering::Greater {
        (b, a)
    } else {
        (a, b)
    };

    let d_lat = (q.latitude() - p.latitude()).to_radians();
    let d_lon = (q.longitude() - p.longitude()).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + p.latitude().to_radians().cos()
            * q.latitude().to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Distance::from_km(EARTH_RADIUS_KM * central_angle)
}

/// Validate raw degree pairs and return the distance between them in km.
///
/// # Errors
///
/// Returns [`CoreError::InvalidCoordinate`] if any component is out of range
/// or non-finite.
pub fn distance_km(
    a_latitude: f64,
    a_longitude: f64,
    b_latitude: f64,
    b_longitude: f64,
) -> Result<f64, CoreError> {
    let a = Coordinate::try_new(a_latitude, a_longitude)?;
    let b = Coordinate::try_new(b_latitude, b_longitude)?;
    Ok(haversine(a, b).km())
}

/// Angular radius (radians) of a spherical cap with the given surface radius.
#[must_use]
pub fn angular_radius(radius_km: f64) -> f64 {
    radius_km / EARTH_RADIUS_KM
}

fn canonical_cmp(a: Coordinate, b: Coordinate) -> Ordering {
    a.latitude()
        .total_cmp(&b.latitude())
        .then_with(|| a.longitude().total_cmp(&b.longitude()))
}
