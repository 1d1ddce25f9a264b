//! Line styles for zone-coloured segments

use crate::{OverlayError, Result, ZoneThresholds};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An sRGB colour, (de)serialized as `"#RRGGBB"`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(OverlayError::Configuration(format!(
                "invalid colour {s:?}, expected #RRGGBB"
            )));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| OverlayError::Configuration(format!("invalid colour {s:?}: {e}")))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = OverlayError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// Shape drawn at the open ends of a line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn as_str(self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

/// Visual style of one polyline
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LineStyleRecord")]
pub struct LineStyle {
    pub color: Rgb,
    /// Stroke width in pixels
    pub weight: f32,
    /// Stroke opacity in `0.0..=1.0`
    pub opacity: f32,
    pub line_cap: LineCap,
}

/// A [`LineStyle`] as written in a configuration file, colour still unparsed
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyleRecord {
    color: String,
    #[serde(default = "default_weight")]
    weight: f32,
    #[serde(default = "default_opacity")]
    opacity: f32,
    #[serde(default)]
    line_cap: LineCap,
}

impl TryFrom<LineStyleRecord> for LineStyle {
    type Error = OverlayError;

    fn try_from(record: LineStyleRecord) -> Result<Self> {
        Ok(Self {
            color: record.color.parse()?,
            weight: record.weight,
            opacity: record.opacity,
            line_cap: record.line_cap,
        })
    }
}

fn default_weight() -> f32 {
    5.0
}

fn default_opacity() -> f32 {
    0.75
}

impl LineStyle {
    /// A style of the given colour with the reference stroke settings
    pub fn with_color(color: Rgb) -> Self {
        Self {
            color,
            weight: default_weight(),
            opacity: default_opacity(),
            line_cap: LineCap::Butt,
        }
    }
}

/// One style per zone, in zone order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleTable(Vec<LineStyle>);

impl StyleTable {
    pub fn new(styles: Vec<LineStyle>) -> Self {
        Self(styles)
    }

    /// Blue (below zone) through green (in zone) to red (above zone)
    pub fn reference() -> Self {
        const PALETTE: [Rgb; 9] = [
            Rgb::new(0x00, 0x00, 0xFF),
            Rgb::new(0x00, 0x40, 0xFF),
            Rgb::new(0x00, 0x80, 0xFF),
            Rgb::new(0x00, 0xFF, 0xB0),
            Rgb::new(0x00, 0xE0, 0x00),
            Rgb::new(0x80, 0xFF, 0x00),
            Rgb::new(0xFF, 0xFF, 0x00),
            Rgb::new(0xFF, 0xC0, 0x00),
            Rgb::new(0xFF, 0x00, 0x00),
        ];
        Self(PALETTE.into_iter().map(LineStyle::with_color).collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, zone: usize) -> Option<&LineStyle> {
        self.0.get(zone)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineStyle> {
        self.0.iter()
    }

    /// Fails unless there is exactly one style per zone
    pub fn check_against(&self, thresholds: &ZoneThresholds) -> Result<()> {
        if self.0.len() != thresholds.zone_count() {
            return Err(OverlayError::Configuration(format!(
                "style table has {} entries but {} thresholds define {} zones",
                self.0.len(),
                thresholds.bounds().len(),
                thresholds.zone_count()
            )));
        }
        Ok(())
    }
}
