//! Zone classification of a continuous metric
//!
//! `n` ascending thresholds split the metric domain into `n + 1` zones:
//! zone 0 is `value <= t0`, zone `i` is `t(i-1) < value <= ti`, and zone `n`
//! (the overflow zone) is everything above the last threshold.
//!
//! A value that is not a number fails every comparison and therefore lands in
//! the overflow zone. Missing metrics are classified the same way.

use crate::{OverlayError, Result};
use serde::{Deserialize, Serialize};

/// Map `value` to a zone index in `0..=thresholds.len()`
///
/// `thresholds` must be ascending. NaN falls through to the overflow zone.
#[inline]
pub fn classify(value: f64, thresholds: &[f64]) -> usize {
    // `!(value <= t)` rather than `value > t`: NaN must count as "above"
    thresholds.partition_point(|&t| !(value <= t))
}

/// Strictly ascending, finite zone boundaries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ZoneThresholds(Vec<f64>);

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ZoneThresholds {
    /// Validate and wrap a list of boundaries
    pub fn new(bounds: Vec<f64>) -> Result<Self> {
        if let Some(bad) = bounds.iter().find(|t| !t.is_finite()) {
            return Err(OverlayError::Configuration(format!(
                "zone threshold {bad} is not finite"
            )));
        }
        if let Some(pair) = bounds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(OverlayError::Configuration(format!(
                "zone thresholds must be strictly ascending, found {} followed by {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self(bounds))
    }

    /// Boundaries used by the reference heart-rate style configuration
    pub fn reference() -> Self {
        Self(vec![5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0])
    }

    #[inline]
    pub fn bounds(&self) -> &[f64] {
        &self.0
    }

    /// Number of zones, always one more than the number of boundaries
    #[inline]
    pub fn zone_count(&self) -> usize {
        self.0.len() + 1
    }

    /// Zone index of `value`, see [`classify`]
    #[inline]
    pub fn classify(&self, value: f64) -> usize {
        classify(value, &self.0)
    }

    /// Zone index of an optional metric; `None` goes to the overflow zone
    #[inline]
    pub fn classify_metric(&self, value: Option<f64>) -> usize {
        self.classify(value.unwrap_or(f64::NAN))
    }

    /// Human-readable range of a zone, e.g. `"5 – 10"`
    ///
    /// Returns `None` for an index past the overflow zone.
    pub fn zone_label(&self, zone: usize) -> Option<String> {
        let n = self.0.len();
        if zone > n {
            return None;
        }
        let label = match (zone, n) {
            (_, 0) => "all values".to_string(),
            (0, _) => format!("≤ {}", self.0[0]),
            (z, n) if z == n => format!("> {}", self.0[n - 1]),
            (z, _) => format!("{} – {}", self.0[z - 1], self.0[z]),
        };
        Some(label)
    }
}

impl TryFrom<Vec<f64>> for ZoneThresholds {
    type Error = OverlayError;

    fn try_from(bounds: Vec<f64>) -> Result<Self> {
        Self::new(bounds)
    }
}

impl From<ZoneThresholds> for Vec<f64> {
    fn from(thresholds: ZoneThresholds) -> Self {
        thresholds.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: [f64; 8] = [5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0];

    #[test]
    fn test_classify_boundaries_are_inclusive() {
        assert_eq!(classify(5.0, &REFERENCE), 0);
        assert_eq!(classify(5.5, &REFERENCE), 1);
        assert_eq!(classify(10.0, &REFERENCE), 1);
        assert_eq!(classify(40.0, &REFERENCE), 7);
        assert_eq!(classify(40.1, &REFERENCE), 8);
    }

    #[test]
    fn test_classify_reference_values() {
        assert_eq!(classify(3.0, &REFERENCE), 0);
        assert_eq!(classify(12.0, &REFERENCE), 2);
        assert_eq!(classify(50.0, &REFERENCE), 8);
        assert_eq!(classify(-100.0, &REFERENCE), 0);
    }

    #[test]
    fn test_classify_nan_is_overflow() {
        assert_eq!(classify(f64::NAN, &REFERENCE), REFERENCE.len());
        assert_eq!(classify(f64::NAN, &[]), 0);
        assert_eq!(classify(f64::NAN, &[1.0]), 1);
    }

    #[test]
    fn test_classify_infinities() {
        assert_eq!(classify(f64::NEG_INFINITY, &REFERENCE), 0);
        assert_eq!(classify(f64::INFINITY, &REFERENCE), 8);
    }

    #[test]
    fn test_classify_empty_thresholds() {
        assert_eq!(classify(0.0, &[]), 0);
        assert_eq!(classify(1e9, &[]), 0);
    }

    #[test]
    fn test_classify_in_range_and_monotonic() {
        let threshold_sets: [&[f64]; 4] = [&[], &[0.0], &[-3.0, 0.5, 2.0], &REFERENCE];

        for thresholds in threshold_sets {
            let mut previous = 0;
            for step in -200..=600 {
                let value = step as f64 * 0.1;
                let zone = classify(value, thresholds);
                assert!(zone <= thresholds.len());
                assert!(zone >= previous, "zone decreased at {value}");
                previous = zone;
            }
        }
    }

    #[test]
    fn test_classify_matches_linear_scan() {
        let linear = |value: f64| {
            REFERENCE
                .iter()
                .position(|&t| value <= t)
                .unwrap_or(REFERENCE.len())
        };
        for step in 0..=100 {
            let value = step as f64 * 0.5;
            assert_eq!(classify(value, &REFERENCE), linear(value));
        }
        assert_eq!(classify(f64::NAN, &REFERENCE), linear(f64::NAN));
    }

    #[test]
    fn test_thresholds_reject_unsorted() {
        assert!(matches!(
            ZoneThresholds::new(vec![1.0, 3.0, 2.0]),
            Err(OverlayError::Configuration(_))
        ));
        assert!(ZoneThresholds::new(vec![1.0, 1.0]).is_err());
        assert!(ZoneThresholds::new(vec![1.0, f64::NAN]).is_err());
        assert!(ZoneThresholds::new(vec![]).is_ok());
    }

    #[test]
    fn test_thresholds_deserialize_validates() {
        let ok: ZoneThresholds = serde_json::from_str("[1, 2.5, 4]").unwrap();
        assert_eq!(ok.bounds(), &[1.0, 2.5, 4.0]);
        assert_eq!(ok.zone_count(), 4);

        assert!(serde_json::from_str::<ZoneThresholds>("[4, 2]").is_err());
    }

    #[test]
    fn test_classify_metric_missing() {
        let thresholds = ZoneThresholds::reference();
        assert_eq!(thresholds.classify_metric(None), 8);
        assert_eq!(thresholds.classify_metric(Some(12.0)), 2);
    }

    #[test]
    fn test_zone_labels() {
        let thresholds = ZoneThresholds::reference();
        assert_eq!(thresholds.zone_label(0).as_deref(), Some("≤ 5"));
        assert_eq!(thresholds.zone_label(2).as_deref(), Some("10 – 15"));
        assert_eq!(thresholds.zone_label(8).as_deref(), Some("> 40"));
        assert_eq!(thresholds.zone_label(9), None);

        let single = ZoneThresholds::new(vec![]).unwrap();
        assert_eq!(single.zone_label(0).as_deref(), Some("all values"));
    }
}
