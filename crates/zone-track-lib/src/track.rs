//! Zone-coloured track construction
//!
//! A track of `n` points yields `n - 1` segments. Each segment takes the
//! style of the zone of its *starting* point; segments are never split at
//! zone crossings.

use crate::{LineStyle, OverlayGroup, Polyline, Result, StyleTable, TrackPoint, ZoneThresholds};

/// Two consecutive track points and the style resolved for them
#[derive(Clone, Copy, Debug)]
pub struct TrackSegment<'a> {
    pub start: &'a TrackPoint,
    pub end: &'a TrackPoint,
    pub zone: usize,
    pub style: &'a LineStyle,
}

/// Selector reading a named metric from each point's metadata
pub fn metric_by_key(key: &str) -> impl Fn(&TrackPoint) -> Option<f64> + '_ {
    move |point| point.meta().metric(key)
}

/// Iterate the styled segments of a track
///
/// The style table is checked against the thresholds before anything else,
/// so a mismatch is reported even for an empty track.
pub fn track_segments<'a, F>(
    points: &'a [TrackPoint],
    metric: F,
    thresholds: &'a ZoneThresholds,
    styles: &'a StyleTable,
) -> Result<impl Iterator<Item = TrackSegment<'a>> + 'a>
where
    F: Fn(&TrackPoint) -> Option<f64> + 'a,
{
    styles.check_against(thresholds)?;

    Ok(points.windows(2).filter_map(move |pair| {
        let zone = thresholds.classify_metric(metric(&pair[0]));
        // check_against guarantees one style per zone
        styles.get(zone).map(|style| TrackSegment {
            start: &pair[0],
            end: &pair[1],
            zone,
            style,
        })
    }))
}

/// Build the overlay group for a track
///
/// Produces one two-point polyline per segment, in point order, and binds
/// `label` to the group. Zero or one point gives an empty group.
pub fn build_track<F>(
    points: &[TrackPoint],
    metric: F,
    thresholds: &ZoneThresholds,
    styles: &StyleTable,
    label: &str,
) -> Result<OverlayGroup>
where
    F: Fn(&TrackPoint) -> Option<f64>,
{
    build_track_runs(&[points], metric, thresholds, styles, label)
}

/// Build one overlay group from a track recorded in separate runs
///
/// Runs are drawn one after another into the same group. No segment joins
/// the last point of a run to the first point of the next, so a gap in
/// recording stays a gap on the map.
pub fn build_track_runs<R, F>(
    runs: &[R],
    metric: F,
    thresholds: &ZoneThresholds,
    styles: &StyleTable,
    label: &str,
) -> Result<OverlayGroup>
where
    R: AsRef<[TrackPoint]>,
    F: Fn(&TrackPoint) -> Option<f64>,
{
    #[cfg(feature = "profiling")]
    profiling::scope!("track::build_track");

    styles.check_against(thresholds)?;

    let mut group = OverlayGroup::with_label(label);
    let mut point_count = 0;
    for run in runs {
        let run = run.as_ref();
        point_count += run.len();
        for segment in track_segments(run, &metric, thresholds, styles)? {
            group.push_polyline(Polyline {
                points: vec![segment.start.position(), segment.end.position()],
                zone: segment.zone,
                style: *segment.style,
            });
        }
    }

    tracing::debug!(
        "Built track {:?}: {} points in {} runs, {} segments",
        label,
        point_count,
        runs.len(),
        group.len()
    );
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OverlayError, PointMeta};
    use std::sync::Arc;

    fn create_test_points(metrics: &[f64]) -> Vec<TrackPoint> {
        metrics
            .iter()
            .enumerate()
            .map(|(i, &cpm)| {
                let meta = PointMeta {
                    cpm: Some(cpm),
                    ..Default::default()
                };
                TrackPoint::new(
                    51.5074 + i as f64 * 0.0001,
                    -0.1278 + i as f64 * 0.0001,
                    None,
                    Arc::new(meta),
                )
            })
            .collect()
    }

    #[test]
    fn test_segment_styles_follow_start_point() {
        let points = create_test_points(&[3.0, 12.0, 50.0]);
        let thresholds = ZoneThresholds::reference();
        let styles = StyleTable::reference();

        let group =
            build_track(&points, metric_by_key("cpm"), &thresholds, &styles, "Hike").unwrap();
        let polylines: Vec<&Polyline> = group.polylines().collect();

        assert_eq!(polylines.len(), 2);
        assert_eq!(polylines[0].zone, 0);
        assert_eq!(&polylines[0].style, styles.get(0).unwrap());
        assert_eq!(polylines[1].zone, 2);
        assert_eq!(&polylines[1].style, styles.get(2).unwrap());
        assert_eq!(group.label(), Some("Hike"));
    }

    #[test]
    fn test_polyline_connects_consecutive_points() {
        let points = create_test_points(&[1.0, 2.0, 3.0]);
        let group = build_track(
            &points,
            metric_by_key("cpm"),
            &ZoneThresholds::reference(),
            &StyleTable::reference(),
            "t",
        )
        .unwrap();

        for (i, polyline) in group.polylines().enumerate() {
            assert_eq!(
                polyline.points,
                vec![points[i].position(), points[i + 1].position()]
            );
        }
    }

    #[test]
    fn test_segment_count() {
        let thresholds = ZoneThresholds::reference();
        let styles = StyleTable::reference();

        for n in 0..6 {
            let points = create_test_points(&vec![10.0; n]);
            let group =
                build_track(&points, metric_by_key("cpm"), &thresholds, &styles, "t").unwrap();
            assert_eq!(group.polylines().count(), n.saturating_sub(1));
        }
    }

    #[test]
    fn test_single_point_is_empty_group() {
        let points = create_test_points(&[7.0]);
        let group = build_track(
            &points,
            metric_by_key("cpm"),
            &ZoneThresholds::reference(),
            &StyleTable::reference(),
            "Lonely",
        )
        .unwrap();

        assert!(group.is_empty());
        assert_eq!(group.label(), Some("Lonely"));
    }

    #[test]
    fn test_style_mismatch_fails_even_without_points() {
        let thresholds = ZoneThresholds::new(vec![1.0, 2.0]).unwrap();
        let styles = StyleTable::reference();

        for metrics in [vec![], vec![1.0], vec![1.0, 2.0, 3.0]] {
            let points = create_test_points(&metrics);
            let result = build_track(&points, metric_by_key("cpm"), &thresholds, &styles, "t");
            assert!(matches!(result, Err(OverlayError::Configuration(_))));
        }
    }

    #[test]
    fn test_missing_metric_uses_overflow_style() {
        let points = create_test_points(&[3.0, 3.0]);
        let thresholds = ZoneThresholds::reference();
        let styles = StyleTable::reference();

        let group = build_track(
            &points,
            metric_by_key("heart_rate"),
            &thresholds,
            &styles,
            "t",
        )
        .unwrap();
        let polyline = group.polylines().next().unwrap();

        assert_eq!(polyline.zone, 8);
        assert_eq!(&polyline.style, styles.get(8).unwrap());
    }

    #[test]
    fn test_runs_are_not_joined() {
        let first = create_test_points(&[3.0, 3.0]);
        let second: Vec<TrackPoint> = [50.0, 50.0]
            .iter()
            .enumerate()
            .map(|(i, &cpm)| {
                let meta = PointMeta {
                    cpm: Some(cpm),
                    ..Default::default()
                };
                TrackPoint::new(10.0 + i as f64 * 0.001, 10.0, None, Arc::new(meta))
            })
            .collect();

        let group = build_track_runs(
            &[first.as_slice(), second.as_slice()],
            metric_by_key("cpm"),
            &ZoneThresholds::reference(),
            &StyleTable::reference(),
            "Two runs",
        )
        .unwrap();
        let polylines: Vec<&Polyline> = group.polylines().collect();

        assert_eq!(polylines.len(), 2);
        assert_eq!(
            polylines[0].points,
            vec![first[0].position(), first[1].position()]
        );
        assert_eq!(
            polylines[1].points,
            vec![second[0].position(), second[1].position()]
        );
        assert_eq!(polylines[1].zone, 8);
    }

    #[test]
    fn test_empty_runs_still_check_styles() {
        let thresholds = ZoneThresholds::new(vec![1.0]).unwrap();
        let runs: [Vec<TrackPoint>; 0] = [];
        let result = build_track_runs(
            &runs,
            metric_by_key("cpm"),
            &thresholds,
            &StyleTable::reference(),
            "t",
        );
        assert!(matches!(result, Err(OverlayError::Configuration(_))));
    }

    #[test]
    fn test_custom_metric_selector() {
        let points = create_test_points(&[0.0, 0.0, 0.0]);
        let thresholds = ZoneThresholds::new(vec![51.50745]).unwrap();
        let styles = StyleTable::new(vec![
            LineStyle::with_color(crate::Rgb::new(0, 0, 255)),
            LineStyle::with_color(crate::Rgb::new(255, 0, 0)),
        ]);

        let zones: Vec<usize> =
            track_segments(&points, |p: &TrackPoint| Some(p.lat()), &thresholds, &styles)
                .unwrap()
                .map(|s| s.zone)
                .collect();

        assert_eq!(zones, vec![0, 1]);
    }
}
