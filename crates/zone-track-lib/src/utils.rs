//! Utility functions for spherical distances

use geo::Point;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Haversine distance in meters between two WGS84 points (x = lon, y = lat)
///
/// Takes the positions by value; `geo::Point` is `Copy`, so callers pass
/// [`TrackPoint::position`](crate::TrackPoint::position) directly.
#[inline]
pub fn haversine_distance(p1: Point<f64>, p2: Point<f64>) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let delta_lat = (p2.y() - p1.y()).to_radians();
    let delta_lon = (p2.x() - p1.x()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}
