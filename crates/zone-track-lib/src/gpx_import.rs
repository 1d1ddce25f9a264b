//! GPX input
//!
//! Each GPX track segment becomes one run of [`RawPoint`]s, in document
//! order. Segment breaks mark gaps in recording and are kept. Standalone
//! waypoints become [`PointOfInterest`]s. Both then go through the same
//! validation as JSON input.

use crate::{PointMeta, PointOfInterest, RawPoint, Result};
use gpx::{Fix, Gpx, Waypoint};
use std::io::Read;
use std::sync::Arc;
use time::OffsetDateTime;

/// Parse a GPX document
pub fn read_gpx<R: Read>(reader: R) -> Result<Gpx> {
    Ok(gpx::read(reader)?)
}

/// Track points of a GPX document, one run per track segment
///
/// Segments without points are dropped.
pub fn raw_runs_from_gpx(gpx: &Gpx) -> Vec<Vec<RawPoint>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("gpx_import::raw_runs_from_gpx");

    let runs: Vec<Vec<RawPoint>> = gpx
        .tracks
        .iter()
        .flat_map(|track| &track.segments)
        .filter(|segment| !segment.points.is_empty())
        .map(|segment| segment.points.iter().map(raw_point_from_waypoint).collect())
        .collect();

    tracing::debug!(
        "Read {} track points in {} runs from {} tracks",
        runs.iter().map(Vec::len).sum::<usize>(),
        runs.len(),
        gpx.tracks.len()
    );
    runs
}

fn raw_point_from_waypoint(waypoint: &Waypoint) -> RawPoint {
    let point = waypoint.point();
    RawPoint {
        lat: Some(point.y()),
        lng: Some(point.x()),
        alt: waypoint.elevation,
        meta: Arc::new(meta_from_waypoint(waypoint)),
    }
}

/// Standalone waypoints of a GPX document as points of interest
pub fn points_of_interest_from_gpx(gpx: &Gpx) -> Vec<PointOfInterest> {
    gpx.waypoints
        .iter()
        .map(|waypoint| {
            let point = waypoint.point();
            PointOfInterest {
                lat: Some(point.y()),
                lng: Some(point.x()),
                meta: Arc::new(meta_from_waypoint(waypoint)),
            }
        })
        .collect()
}

fn meta_from_waypoint(waypoint: &Waypoint) -> PointMeta {
    // gpx::Time wraps time::OffsetDateTime and implements From
    let time = waypoint
        .time
        .map(|t| OffsetDateTime::from(t).unix_timestamp() as f64);

    PointMeta {
        time,
        speed: waypoint.speed,
        hdop: waypoint.hdop,
        vdop: waypoint.vdop,
        pdop: waypoint.pdop,
        altitude: waypoint.elevation,
        fix: waypoint.fix.as_ref().and_then(fix_name),
        satellites: waypoint.sat.and_then(|s| u32::try_from(s).ok()),
        name: waypoint.name.clone(),
        ..Default::default()
    }
}

fn fix_name(fix: &Fix) -> Option<String> {
    match fix {
        Fix::None => None,
        Fix::TwoDimensional => Some("2d".to_string()),
        Fix::ThreeDimensional => Some("3d".to_string()),
        Fix::DGPS => Some("dgps".to_string()),
        Fix::PPS => Some("pps".to_string()),
        Fix::Other(other) => Some(other.clone()),
    }
}
