//! Great-circle distance and bounding-box helpers.

use serde::{Deserialize, Serialize};

use crate::types::Coordinate;
use crate::CoreError;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Bounding boxes are not computed at or beyond this latitude; the
/// longitude delta divides by `cos(lat)` and blows up near the poles.
pub const MAX_SUPPORTED_LATITUDE: f64 = 89.9;

/// Slack added to every edge so a box printed at six decimals still covers
/// the circle.
const EDGE_PAD_DEG: f64 = 1e-5;

/// Axis-aligned lat/lon box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north_east: Coordinate,
    pub south_west: Coordinate,
}

impl BoundingBox {
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        point.latitude >= self.south_west.latitude
            && point.latitude <= self.north_east.latitude
            && point.longitude >= self.south_west.longitude
            && point.longitude <= self.north_east.longitude
    }
}

/// Haversine distance in kilometres.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Smallest lat/lon box containing every point within `radius_km` of
/// `center`.
///
/// Longitude extent is `asin(sin(r) / cos(lat))`, the exact half-width of a
/// spherical cap. A circle that reaches a pole or crosses the antimeridian
/// gets the full `[-180, 180]` longitude range instead of a truncated box.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] when `|center.latitude| >= 89.9` or the
/// radius is negative or non-finite.
pub fn bounding_box(center: Coordinate, radius_km: f64) -> Result<BoundingBox, CoreError> {
    if center.latitude.abs() >= MAX_SUPPORTED_LATITUDE {
        return Err(CoreError::Validation(format!(
            "latitude {} is too close to a pole for a bounding box",
            center.latitude
        )));
    }
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(CoreError::Validation(format!(
            "radius {radius_km} km is not a usable distance"
        )));
    }

    let angle = radius_km / EARTH_RADIUS_KM;
    let d_lat = angle.to_degrees() + EDGE_PAD_DEG;
    let north = center.latitude + d_lat;
    let south = center.latitude - d_lat;

    let (west, east) = if north >= 90.0 || south <= -90.0 {
        (-180.0, 180.0)
    } else {
        longitude_span(center, angle)
    };

    Ok(BoundingBox {
        north_east: Coordinate {
            latitude: north.min(90.0),
            longitude: east,
        },
        south_west: Coordinate {
            latitude: south.max(-90.0),
            longitude: west,
        },
    })
}

/// West and east edges for a cap that does not contain a pole.
fn longitude_span(center: Coordinate, angle: f64) -> (f64, f64) {
    let ratio = angle.sin() / center.latitude.to_radians().cos();
    if ratio >= 1.0 {
        return (-180.0, 180.0);
    }
    let d_lon = ratio.asin().to_degrees() + EDGE_PAD_DEG;
    let west = center.longitude - d_lon;
    let east = center.longitude + d_lon;
    if west < -180.0 || east > 180.0 {
        (-180.0, 180.0)
    } else {
        (west, east)
    }
}
