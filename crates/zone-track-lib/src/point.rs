//! Point records and their normalization
//!
//! Raw records arrive in the leaflet export format
//! (`{lat, lng, alt?, meta: {...}}`). [`normalize`] turns them into
//! [`TrackPoint`]s, one per record, in input order, sharing each record's
//! metadata instead of copying it.

use crate::{OverlayError, Result, ValidationIssue};
use geo::Point;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

/// Typed metadata attached to a point
///
/// Known keys of the GPS log export are named fields; anything else lands in
/// [`PointMeta::extra`]. A missing field is `None`, never zero. A named field
/// holding a value of the wrong type (`"cpm": "n/a"`) is also `None`, the same
/// as an unknown key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointMeta {
    /// Fix time in unix seconds
    #[serde(default, deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    /// Ground speed in metres per second
    #[serde(default, deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdop: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vdop: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdop: Option<f64>,
    /// Altitude in metres, as reported by the receiver
    #[serde(default, deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Radiation counts per minute
    #[serde(default, deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    /// Fix type ("2d", "3d", ...)
    #[serde(default, deserialize_with = "lenient_text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    /// Number of satellites in view
    #[serde(default, deserialize_with = "lenient_count")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satellites: Option<u32>,
    /// Display name (required for points of interest)
    #[serde(default, deserialize_with = "lenient_text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Any other key of the source record
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PointMeta {
    /// Resolve a numeric metric by key
    ///
    /// Named numeric fields are looked up first, then [`PointMeta::extra`].
    /// Returns `None` when the key is unknown or its value is not a number.
    pub fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "time" => self.time,
            "speed" => self.speed,
            "hdop" => self.hdop,
            "vdop" => self.vdop,
            "pdop" => self.pdop,
            "altitude" => self.altitude,
            "cpm" => self.cpm,
            "satellites" => self.satellites.map(f64::from),
            _ => self.extra.get(key).and_then(serde_json::Value::as_f64),
        }
    }

    /// Display name, if present and not blank
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// A point record as supplied by the data source
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<f64>,
    #[serde(default)]
    pub meta: Arc<PointMeta>,
}

impl RawPoint {
    /// Create a raw point with the given coordinate and metadata
    pub fn new(lat: f64, lng: f64, alt: Option<f64>, meta: PointMeta) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            alt,
            meta: Arc::new(meta),
        }
    }
}

/// A validated track point: coordinate plus shared metadata
#[derive(Clone, Debug, PartialEq)]
pub struct TrackPoint {
    /// Position with x = longitude, y = latitude (degrees)
    position: Point<f64>,
    altitude: Option<f64>,
    meta: Arc<PointMeta>,
}

impl TrackPoint {
    pub fn new(lat: f64, lng: f64, altitude: Option<f64>, meta: Arc<PointMeta>) -> Self {
        Self {
            position: Point::new(lng, lat),
            altitude,
            meta,
        }
    }

    #[inline]
    pub fn position(&self) -> Point<f64> {
        self.position
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.position.y()
    }

    #[inline]
    pub fn lng(&self) -> f64 {
        self.position.x()
    }

    #[inline]
    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    #[inline]
    pub fn meta(&self) -> &PointMeta {
        &self.meta
    }

    /// The metadata handle, shared with the record this point was built from
    #[inline]
    pub fn shared_meta(&self) -> &Arc<PointMeta> {
        &self.meta
    }
}

/// Convert raw records into track points
///
/// Fails on the first record with a missing or non-numeric coordinate; no
/// partial output is returned.
pub fn normalize(raw_points: &[RawPoint]) -> Result<Vec<TrackPoint>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("point::normalize");

    let points = raw_points
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let (lat, lng) = validate_coordinates(index, raw.lat, raw.lng)?;
            Ok(TrackPoint::new(lat, lng, raw.alt, Arc::clone(&raw.meta)))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!("Normalized {} track points", points.len());
    Ok(points)
}

/// Convert several runs of raw records, keeping the runs apart
///
/// The index of a reported [`OverlayError::Validation`] counts records across
/// all runs in order, as if they were one sequence.
pub fn normalize_runs<R: AsRef<[RawPoint]>>(runs: &[R]) -> Result<Vec<Vec<TrackPoint>>> {
    let mut offset = 0;
    runs.iter()
        .map(|run| {
            let run = run.as_ref();
            let points = normalize(run).map_err(|e| match e {
                OverlayError::Validation { index, issue } => OverlayError::Validation {
                    index: index + offset,
                    issue,
                },
                other => other,
            })?;
            offset += run.len();
            Ok(points)
        })
        .collect()
}

/// Parse a JSON array of raw point records
pub fn parse_raw_points(json: &str) -> Result<Vec<RawPoint>> {
    Ok(serde_json::from_str(json)?)
}

/// Read a JSON array of raw point records
pub fn read_raw_points<R: Read>(reader: R) -> Result<Vec<RawPoint>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Check that both coordinates are present and numeric
pub(crate) fn validate_coordinates(
    index: usize,
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<(f64, f64)> {
    let invalid = |issue| OverlayError::Validation { index, issue };

    let lat = lat.ok_or_else(|| invalid(ValidationIssue::MissingLatitude))?;
    if !lat.is_finite() {
        return Err(invalid(ValidationIssue::NonNumericLatitude));
    }
    let lng = lng.ok_or_else(|| invalid(ValidationIssue::MissingLongitude))?;
    if !lng.is_finite() {
        return Err(invalid(ValidationIssue::NonNumericLongitude));
    }

    if !(-90.0..=90.0).contains(&lat) {
        tracing::warn!("Latitude out of range at index {}: {}", index, lat);
    }

    Ok((lat, lng))
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok()))
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }))
}

/// Accept any JSON value for a coordinate; non-numbers become NaN so that
/// validation reports them instead of the parser
pub(crate) fn lenient_coordinate<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|v| v.as_f64().unwrap_or(f64::NAN)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_meta(cpm: f64) -> PointMeta {
        PointMeta {
            cpm: Some(cpm),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_single_point() {
        let raw = vec![RawPoint::new(1.0, 2.0, Some(3.0), create_test_meta(5.0))];
        let points = normalize(&raw).unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].lat(), 1.0);
        assert_eq!(points[0].lng(), 2.0);
        assert_eq!(points[0].altitude(), Some(3.0));
        assert_eq!(points[0].meta().cpm, Some(5.0));
    }

    #[test]
    fn test_normalize_from_json() {
        let raw = parse_raw_points(r#"[{"lat": 1, "lng": 2, "alt": 3, "meta": {"cpm": 5}}]"#)
            .unwrap();
        let points = normalize(&raw).unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].position(), Point::new(2.0, 1.0));
        assert_eq!(points[0].altitude(), Some(3.0));
        assert_eq!(points[0].meta().metric("cpm"), Some(5.0));
    }

    #[test]
    fn test_normalize_preserves_order() {
        let raw: Vec<RawPoint> = (0..5)
            .map(|i| RawPoint::new(i as f64, -(i as f64), None, PointMeta::default()))
            .collect();
        let points = normalize(&raw).unwrap();

        let lats: Vec<f64> = points.iter().map(TrackPoint::lat).collect();
        assert_eq!(lats, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_normalize_shares_metadata() {
        let raw = vec![RawPoint::new(1.0, 2.0, None, create_test_meta(7.0))];
        let points = normalize(&raw).unwrap();

        assert!(Arc::ptr_eq(points[0].shared_meta(), &raw[0].meta));
    }

    #[test]
    fn test_missing_altitude_is_absent() {
        let raw = parse_raw_points(r#"[{"lat": 1.5, "lng": 2.5, "meta": {}}]"#).unwrap();
        let points = normalize(&raw).unwrap();
        assert_eq!(points[0].altitude(), None);
    }

    #[test]
    fn test_missing_latitude_fails() {
        let raw = parse_raw_points(
            r#"[{"lat": 1, "lng": 2, "meta": {}}, {"lng": 2, "meta": {}}]"#,
        )
        .unwrap();
        let err = normalize(&raw).unwrap_err();

        assert!(matches!(
            err,
            OverlayError::Validation {
                index: 1,
                issue: ValidationIssue::MissingLatitude
            }
        ));
    }

    #[test]
    fn test_non_numeric_longitude_fails() {
        let raw = parse_raw_points(r#"[{"lat": 1, "lng": "east", "meta": {}}]"#).unwrap();
        let err = normalize(&raw).unwrap_err();

        assert!(matches!(
            err,
            OverlayError::Validation {
                index: 0,
                issue: ValidationIssue::NonNumericLongitude
            }
        ));
    }

    #[test]
    fn test_nan_coordinate_fails() {
        let raw = vec![RawPoint::new(f64::NAN, 2.0, None, PointMeta::default())];
        assert!(matches!(
            normalize(&raw),
            Err(OverlayError::Validation {
                issue: ValidationIssue::NonNumericLatitude,
                ..
            })
        ));
    }

    #[test]
    fn test_metric_lookup() {
        let meta: PointMeta = serde_json::from_str(
            r#"{"cpm": 12, "satellites": 9, "heart_rate": 141, "fix": "3d", "label": "x"}"#,
        )
        .unwrap();

        assert_eq!(meta.metric("cpm"), Some(12.0));
        assert_eq!(meta.metric("satellites"), Some(9.0));
        assert_eq!(meta.metric("heart_rate"), Some(141.0));
        assert_eq!(meta.metric("label"), None);
        assert_eq!(meta.metric("speed"), None);
        assert_eq!(meta.fix.as_deref(), Some("3d"));
    }

    #[test]
    fn test_non_numeric_metric_is_absent() {
        let raw = parse_raw_points(
            r#"[{"lat": 1, "lng": 2, "meta": {"cpm": "n/a", "speed": "?", "satellites": 7.5}},
                {"lat": 1.001, "lng": 2, "meta": {"cpm": 4, "name": 12, "fix": null}}]"#,
        )
        .unwrap();
        let points = normalize(&raw).unwrap();

        assert_eq!(points[0].meta().cpm, None);
        assert_eq!(points[0].meta().speed, None);
        assert_eq!(points[0].meta().satellites, None);
        assert_eq!(points[1].meta().cpm, Some(4.0));
        assert_eq!(points[1].meta().name, None);

        let group = crate::OverlayConfig::default()
            .build_track(&points, "t")
            .unwrap();
        assert_eq!(group.polylines().next().unwrap().zone, 8);
    }

    #[test]
    fn test_normalize_runs_reports_overall_index() {
        let first = vec![RawPoint::new(1.0, 2.0, None, PointMeta::default()); 2];
        let second = vec![
            RawPoint::new(1.0, 2.0, None, PointMeta::default()),
            RawPoint {
                lat: None,
                ..RawPoint::new(0.0, 2.0, None, PointMeta::default())
            },
        ];

        let err = normalize_runs(&[first.clone(), second]).unwrap_err();
        assert!(matches!(
            err,
            OverlayError::Validation {
                index: 3,
                issue: ValidationIssue::MissingLatitude
            }
        ));

        let runs = normalize_runs(&[first.clone(), first]).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].len(), 2);
    }

    #[test]
    fn test_display_name() {
        let named = PointMeta {
            name: Some("  Summit  ".to_string()),
            ..Default::default()
        };
        let blank = PointMeta {
            name: Some("   ".to_string()),
            ..Default::default()
        };

        assert_eq!(named.display_name(), Some("Summit"));
        assert_eq!(blank.display_name(), None);
        assert_eq!(PointMeta::default().display_name(), None);
    }
}
