//! Renderer seam
//!
//! The library never touches a live map. A map integration implements
//! [`OverlayRenderer`] and receives the primitives of a group in order;
//! adding the resulting group to the visible map stays with the caller.

use crate::{Marker, OverlayGroup, Polyline, Primitive, ZoneThresholds};
use serde_json::{Map, Value, json};

/// Minimal surface of a map-rendering collaborator
pub trait OverlayRenderer {
    /// Renderer-owned group handle
    type Group;

    fn create_group(&mut self) -> Self::Group;

    fn add_polyline(&mut self, group: &mut Self::Group, polyline: &Polyline);

    fn add_marker(&mut self, group: &mut Self::Group, marker: &Marker);

    fn bind_label(&mut self, group: &mut Self::Group, label: &str);
}

impl OverlayGroup {
    /// Replay this group into a renderer, primitives first, then the label
    pub fn render<R: OverlayRenderer>(&self, renderer: &mut R) -> R::Group {
        let mut group = renderer.create_group();
        for primitive in self.primitives() {
            match primitive {
                Primitive::Polyline(polyline) => renderer.add_polyline(&mut group, polyline),
                Primitive::Marker(marker) => renderer.add_marker(&mut group, marker),
            }
        }
        if let Some(label) = self.label() {
            renderer.bind_label(&mut group, label);
        }
        group
    }
}

/// Renders overlay groups as GeoJSON `FeatureCollection`s
#[derive(Debug, Default)]
pub struct GeoJsonRenderer {
    /// Adds a `zoneLabel` property to line features when set
    thresholds: Option<ZoneThresholds>,
}

impl GeoJsonRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe each line's zone range using these thresholds
    pub fn with_zone_labels(thresholds: ZoneThresholds) -> Self {
        Self {
            thresholds: Some(thresholds),
        }
    }
}

impl OverlayRenderer for GeoJsonRenderer {
    type Group = Value;

    fn create_group(&mut self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [],
        })
    }

    fn add_polyline(&mut self, group: &mut Value, polyline: &Polyline) {
        let coordinates: Vec<[f64; 2]> = polyline.points.iter().map(|p| [p.x(), p.y()]).collect();
        let mut properties = Map::new();
        properties.insert("zone".into(), json!(polyline.zone));
        properties.insert("color".into(), json!(polyline.style.color.to_string()));
        properties.insert("weight".into(), json!(polyline.style.weight));
        properties.insert("opacity".into(), json!(polyline.style.opacity));
        properties.insert("lineCap".into(), json!(polyline.style.line_cap.as_str()));
        if let Some(label) = self
            .thresholds
            .as_ref()
            .and_then(|t| t.zone_label(polyline.zone))
        {
            properties.insert("zoneLabel".into(), json!(label));
        }

        push_feature(
            group,
            json!({
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": coordinates },
                "properties": properties,
            }),
        );
    }

    fn add_marker(&mut self, group: &mut Value, marker: &Marker) {
        push_feature(
            group,
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [marker.position.x(), marker.position.y()],
                },
                "properties": {
                    "icon": marker.icon.name(),
                    "popup": marker.popup,
                },
            }),
        );
    }

    fn bind_label(&mut self, group: &mut Value, label: &str) {
        if let Some(collection) = group.as_object_mut() {
            collection.insert("name".into(), json!(label));
        }
    }
}

fn push_feature(group: &mut Value, feature: Value) {
    if let Some(features) = group.get_mut("features").and_then(Value::as_array_mut) {
        features.push(feature);
    }
}
