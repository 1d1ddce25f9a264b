//! Overlay configuration
//!
//! The zone thresholds and the style table are inputs, never computed. A
//! configuration is validated when it is constructed or loaded, so a style
//! table that does not match the thresholds is rejected before any track is
//! built.

use crate::style::LineStyleRecord;
use crate::{
    LineStyle, OverlayError, OverlayGroup, Result, StyleTable, TrackPoint, TrackSummary,
    ZoneThresholds, build_track_runs, metric_by_key, summarize_runs,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which metric to colour by, its zones, and one style per zone
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Metadata key of the metric, e.g. `"cpm"` or `"heart_rate"`
    /// Default: "cpm"
    pub metric_key: String,
    /// Default: 5, 10, ..., 40
    pub thresholds: ZoneThresholds,
    /// Default: blue to red, 9 entries
    pub styles: StyleTable,
}

/// JSON form of [`OverlayConfig`]; every check happens after parsing so that
/// bad values surface as [`OverlayError::Configuration`]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default = "default_metric_key")]
    metric_key: String,
    thresholds: Option<Vec<f64>>,
    styles: Option<Vec<LineStyleRecord>>,
}

fn default_metric_key() -> String {
    "cpm".to_string()
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            metric_key: default_metric_key(),
            thresholds: ZoneThresholds::reference(),
            styles: StyleTable::reference(),
        }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl OverlayConfig {
    /// Create a validated configuration
    pub fn new(
        metric_key: impl Into<String>,
        thresholds: ZoneThresholds,
        styles: StyleTable,
    ) -> Result<Self> {
        let config = Self {
            metric_key: metric_key.into(),
            thresholds,
            styles,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the style table against the thresholds
    pub fn validate(&self) -> Result<()> {
        if self.metric_key.trim().is_empty() {
            return Err(OverlayError::Configuration(
                "metric key must not be empty".to_string(),
            ));
        }
        self.styles.check_against(&self.thresholds)
    }

    /// Parse and validate a JSON configuration
    ///
    /// Omitted keys take their defaults. Malformed JSON is a
    /// [`OverlayError::Json`]; unordered thresholds, bad colours and a style
    /// count that does not match the zones are [`OverlayError::Configuration`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;

        let thresholds = match file.thresholds {
            Some(bounds) => ZoneThresholds::new(bounds)?,
            None => ZoneThresholds::reference(),
        };
        let styles = match file.styles {
            Some(records) => StyleTable::new(
                records
                    .into_iter()
                    .map(LineStyle::try_from)
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => StyleTable::reference(),
        };

        Self::new(file.metric_key, thresholds, styles)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading overlay configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Build the zone-coloured track overlay for `points`
    pub fn build_track(&self, points: &[TrackPoint], label: &str) -> Result<OverlayGroup> {
        self.build_track_runs(&[points], label)
    }

    /// Build one overlay group for a track recorded in several runs
    pub fn build_track_runs<R: AsRef<[TrackPoint]>>(
        &self,
        runs: &[R],
        label: &str,
    ) -> Result<OverlayGroup> {
        build_track_runs(
            runs,
            metric_by_key(&self.metric_key),
            &self.thresholds,
            &self.styles,
            label,
        )
    }

    /// Summarize `points` with this configuration's metric and zones
    pub fn summarize(&self, points: &[TrackPoint]) -> TrackSummary {
        self.summarize_runs(&[points])
    }

    /// Summarize a track recorded in several runs
    pub fn summarize_runs<R: AsRef<[TrackPoint]>>(&self, runs: &[R]) -> TrackSummary {
        summarize_runs(runs, metric_by_key(&self.metric_key), &self.thresholds)
    }
}
