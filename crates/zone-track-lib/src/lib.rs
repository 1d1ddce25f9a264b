//! Zone Track Library - Zone-coloured track overlays for map renderers
//!
//! This library turns geo-tagged movement tracks and points of interest into
//! renderer-agnostic overlay groups. Track segments are coloured by a per-sample
//! metric (heart rate, counts per minute, speed, ...) bucketed into ordered zones.
//!
//! # Architecture
//!
//! - **[`normalize`]**: raw point records into [`TrackPoint`]s sharing their metadata
//! - **[`ZoneThresholds`]**: ordered boundaries mapping a metric value to a zone index
//! - **[`build_track`]**: one styled polyline per pair of consecutive points
//! - **[`build_points`]**: marker groups for photos and candidate sites
//! - **[`OverlayRenderer`]**: the seam to whatever map widget draws the groups
//! - **[`summarize`]** and **[`estimate_calories`]**: per-track statistics
//!
//! Every build operation is a pure, single-pass transformation returning a fresh
//! [`OverlayGroup`]. Which group is visible is the caller's business.

mod calories;
mod config;
mod gpx_import;
mod overlay;
mod point;
mod render;
mod style;
mod summary;
mod track;
pub mod utils;
mod zones;

// Public API exports
pub use calories::{
    CalorieEstimate, CalorieParams, estimate_calories, estimate_calories_runs,
    resting_rate_mifflin_st_jeor,
};
pub use config::OverlayConfig;
pub use gpx_import::{points_of_interest_from_gpx, raw_runs_from_gpx, read_gpx};
pub use overlay::{
    Marker, MarkerIcon, OverlayGroup, PoiVariant, PointOfInterest, Polyline, Primitive,
    build_points, parse_points_of_interest, read_points_of_interest,
};
pub use point::{
    PointMeta, RawPoint, TrackPoint, normalize, normalize_runs, parse_raw_points, read_raw_points,
};
pub use render::{GeoJsonRenderer, OverlayRenderer};
pub use style::{LineCap, LineStyle, Rgb, StyleTable};
pub use summary::{TrackSummary, summarize, summarize_runs};
pub use track::{TrackSegment, build_track, build_track_runs, metric_by_key, track_segments};
pub use zones::{ZoneThresholds, classify};

/// Reason a point or point-of-interest record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("missing latitude")]
    MissingLatitude,

    #[error("missing longitude")]
    MissingLongitude,

    #[error("latitude is not a number")]
    NonNumericLatitude,

    #[error("longitude is not a number")]
    NonNumericLongitude,

    #[error("missing name")]
    MissingName,
}

/// Error types for overlay construction and input loading
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Invalid record at index {index}: {issue}")]
    Validation {
        index: usize,
        issue: ValidationIssue,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
