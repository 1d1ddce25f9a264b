//! Overlay groups and point-of-interest markers
//!
//! An [`OverlayGroup`] is the unit handed to a map renderer: an ordered list
//! of drawable primitives plus an optional bound label. Groups are created
//! fresh by every build call and owned by the caller afterwards.

use crate::point::{lenient_coordinate, validate_coordinates};
use crate::{LineStyle, OverlayError, PointMeta, Result, ValidationIssue};
use geo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;

/// A styled line through one or more consecutive positions
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    /// Positions with x = longitude, y = latitude
    pub points: Vec<Point<f64>>,
    /// Zone the style was resolved from
    pub zone: usize,
    pub style: LineStyle,
}

/// Icon drawn for a marker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerIcon {
    /// Plain map pin
    DefaultPin,
    /// Pin with a question mark, for sites still to be confirmed
    QuestionPin,
}

impl MarkerIcon {
    pub fn name(self) -> &'static str {
        match self {
            MarkerIcon::DefaultPin => "default",
            MarkerIcon::QuestionPin => "question",
        }
    }
}

/// Which kind of point of interest a marker group shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiVariant {
    /// Photo locations and other ordinary points
    #[default]
    Standard,
    /// Candidate sites, drawn with a distinct pin
    Flagged,
}

impl PoiVariant {
    /// The icon is chosen by variant alone
    pub fn icon(self) -> MarkerIcon {
        match self {
            PoiVariant::Standard => MarkerIcon::DefaultPin,
            PoiVariant::Flagged => MarkerIcon::QuestionPin,
        }
    }
}

/// A marker with its popup text
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub position: Point<f64>,
    pub icon: MarkerIcon,
    pub popup: String,
}

/// A drawable primitive of an overlay group
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Polyline(Polyline),
    Marker(Marker),
}

/// Renderer-agnostic bundle of primitives, toggled on the map as one unit
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayGroup {
    label: Option<String>,
    primitives: Vec<Primitive>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl OverlayGroup {
    /// Create an empty group without a label
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty group with a bound display label
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            primitives: Vec::new(),
        }
    }

    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn push_polyline(&mut self, polyline: Polyline) {
        self.primitives.push(Primitive::Polyline(polyline));
    }

    pub fn push_marker(&mut self, marker: Marker) {
        self.primitives.push(Primitive::Marker(marker));
    }

    /// All primitives in insertion order
    #[inline]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn polylines(&self) -> impl Iterator<Item = &Polyline> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Polyline(polyline) => Some(polyline),
            Primitive::Marker(_) => None,
        })
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Marker(marker) => Some(marker),
            Primitive::Polyline(_) => None,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Bounding rectangle of every primitive, `None` for an empty group
    pub fn bounds(&self) -> Option<Rect<f64>> {
        let mut positions = self.primitives.iter().flat_map(|p| match p {
            Primitive::Polyline(polyline) => polyline.points.as_slice(),
            Primitive::Marker(marker) => std::slice::from_ref(&marker.position),
        });

        let first = positions.next()?;
        let (mut min_x, mut min_y) = (first.x(), first.y());
        let (mut max_x, mut max_y) = (min_x, min_y);
        for point in positions {
            min_x = min_x.min(point.x());
            min_y = min_y.min(point.y());
            max_x = max_x.max(point.x());
            max_y = max_y.max(point.y());
        }

        Some(Rect::new(
            geo::Coord { x: min_x, y: min_y },
            geo::Coord { x: max_x, y: max_y },
        ))
    }

    /// Merge runs of connected polylines sharing a zone and style
    ///
    /// The drawn result is the same; renderers just get fewer, longer lines.
    /// Markers and the label are kept as they are.
    pub fn coalesced(&self) -> OverlayGroup {
        let mut primitives: Vec<Primitive> = Vec::with_capacity(self.primitives.len());

        for primitive in &self.primitives {
            if let (Primitive::Polyline(next), Some(Primitive::Polyline(current))) =
                (primitive, primitives.last_mut())
                && current.zone == next.zone
                && current.style == next.style
                && current.points.last() == next.points.first()
            {
                current.points.extend(next.points.iter().skip(1));
                continue;
            }
            primitives.push(primitive.clone());
        }

        OverlayGroup {
            label: self.label.clone(),
            primitives,
        }
    }
}

/// A point of interest: coordinate plus metadata carrying a display name
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lng: Option<f64>,
    #[serde(default)]
    pub meta: Arc<PointMeta>,
}

impl PointOfInterest {
    pub fn new(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            meta: Arc::new(PointMeta {
                name: Some(name.into()),
                ..Default::default()
            }),
        }
    }
}

/// Build a marker group for points of interest
///
/// Every point becomes one marker, in input order, with the popup
/// `"<name>\n<lat>,<lng>"` and the icon of `variant`. The batch is
/// all-or-nothing: the first point (in input order) with a bad coordinate or
/// no name fails the call.
pub fn build_points(pois: &[PointOfInterest], variant: PoiVariant) -> Result<OverlayGroup> {
    #[cfg(feature = "profiling")]
    profiling::scope!("overlay::build_points");

    let icon = variant.icon();
    let markers = pois
        .iter()
        .enumerate()
        .map(|(index, poi)| {
            let (lat, lng) = validate_coordinates(index, poi.lat, poi.lng)?;
            let name = poi.meta.display_name().ok_or(OverlayError::Validation {
                index,
                issue: ValidationIssue::MissingName,
            })?;
            Ok(Marker {
                position: Point::new(lng, lat),
                icon,
                popup: format!("{name}\n{lat},{lng}"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut group = OverlayGroup::new();
    for marker in markers {
        group.push_marker(marker);
    }

    tracing::debug!("Built {} {:?} markers", group.len(), variant);
    Ok(group)
}

/// Parse a JSON array of points of interest
pub fn parse_points_of_interest(json: &str) -> Result<Vec<PointOfInterest>> {
    Ok(serde_json::from_str(json)?)
}

/// Read a JSON array of points of interest
pub fn read_points_of_interest<R: Read>(reader: R) -> Result<Vec<PointOfInterest>> {
    Ok(serde_json::from_reader(reader)?)
}
