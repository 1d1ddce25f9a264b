//! Per-track statistics

use crate::{TrackPoint, ZoneThresholds, utils};
use serde::Serialize;

/// Totals for one track, split by zone
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrackSummary {
    pub point_count: usize,
    pub segment_count: usize,
    /// Total haversine distance in meters
    pub distance_meters: f64,
    /// Largest metric value seen, ignoring points without one
    pub max_metric: Option<f64>,
    /// Segments per zone, indexed by zone
    pub zone_segments: Vec<usize>,
    /// Distance per zone in meters, indexed by zone
    pub zone_distance_meters: Vec<f64>,
}

/// Summarize a track
///
/// Segments are attributed to the zone of their starting point, the same
/// rule the track builder uses for styling.
pub fn summarize<F>(points: &[TrackPoint], metric: F, thresholds: &ZoneThresholds) -> TrackSummary
where
    F: Fn(&TrackPoint) -> Option<f64>,
{
    summarize_runs(&[points], metric, thresholds)
}

/// Summarize a track recorded in separate runs
///
/// The step from one run to the next is not a segment and adds no distance.
pub fn summarize_runs<R, F>(runs: &[R], metric: F, thresholds: &ZoneThresholds) -> TrackSummary
where
    R: AsRef<[TrackPoint]>,
    F: Fn(&TrackPoint) -> Option<f64>,
{
    #[cfg(feature = "profiling")]
    profiling::scope!("summary::summarize");

    let zones = thresholds.zone_count();
    let mut summary = TrackSummary {
        zone_segments: vec![0; zones],
        zone_distance_meters: vec![0.0; zones],
        ..Default::default()
    };

    for run in runs {
        let run = run.as_ref();
        summary.point_count += run.len();

        let mut previous: Option<(&TrackPoint, usize)> = None;
        for point in run {
            let value = metric(point).filter(|v| !v.is_nan());
            if let Some(v) = value {
                summary.max_metric = Some(summary.max_metric.map_or(v, |max| max.max(v)));
            }

            if let Some((start, zone)) = previous {
                let distance = utils::haversine_distance(start.position(), point.position());
                summary.segment_count += 1;
                summary.distance_meters += distance;
                summary.zone_segments[zone] += 1;
                summary.zone_distance_meters[zone] += distance;
            }

            previous = Some((point, thresholds.classify_metric(value)));
        }
    }

    summary
}
