use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

/// Overlay groups the CLI can emit
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Layer {
    /// The zone-coloured track
    Track,
    /// Photo markers
    Photos,
    /// Candidate-site markers
    Candidates,
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Zone Track - turn GPS logs into zone-coloured GeoJSON overlays
pub struct Settings {
    /// Track to colour: a JSON array of {lat, lng, alt, meta} records or a .gpx file
    #[clap(short, long, value_name = "FILE")]
    pub track: Option<PathBuf>,

    /// Photo locations: JSON array of {lat, lng, meta: {name}} or .gpx waypoints
    #[clap(short, long, value_name = "FILE")]
    pub photos: Vec<PathBuf>,

    /// Candidate sites, drawn with the question-mark pin
    #[clap(short = 'C', long, value_name = "FILE")]
    pub candidates: Vec<PathBuf>,

    /// Overlay configuration (JSON: metricKey, thresholds, styles)
    #[clap(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Metadata key to colour the track by, overriding the configuration
    #[clap(short, long)]
    pub metric: Option<String>,

    /// Track label shown in its popup (defaults to the track file name)
    #[clap(short, long)]
    pub label: Option<String>,

    /// Layers to emit, in this order
    #[clap(long, value_enum, value_delimiter = ',', default_values_t = vec![Layer::Track, Layer::Photos, Layer::Candidates])]
    pub layers: Vec<Layer>,

    /// Merge consecutive same-zone segments into longer lines
    #[clap(long)]
    pub coalesce: bool,

    /// Print track statistics instead of GeoJSON
    #[clap(long)]
    pub summary: bool,

    #[clap(flatten)]
    pub calories: CalorieArgs,

    /// Output file (stdout when omitted)
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Verbose output, repeat for more
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Walker and load for the calorie estimate added to `--summary`
#[derive(Args, Debug, Clone, Default)]
pub struct CalorieArgs {
    /// Body mass in kg; adds a calorie estimate to the summary
    #[clap(long, value_name = "KG", requires = "summary")]
    pub body_mass: Option<f64>,

    /// Pack mass at the start of the track, in kg
    #[clap(long, value_name = "KG", default_value_t = 0.0)]
    pub pack_start: f64,

    /// Pack mass at the end of the track, in kg
    #[clap(long, value_name = "KG", default_value_t = 0.0)]
    pub pack_end: f64,

    /// Resting metabolic rate in ml O2/kg/min (default: from --height, --age, --male)
    #[clap(long, value_name = "RATE")]
    pub rmr: Option<f64>,

    /// Height in cm
    #[clap(long, value_name = "CM")]
    pub height: Option<f64>,

    /// Age in years
    #[clap(long, value_name = "YEARS")]
    pub age: Option<f64>,

    /// Use the male resting-rate formula
    #[clap(long)]
    pub male: bool,

    /// Cost every n-th track point only
    #[clap(long, value_name = "N", default_value_t = 1)]
    pub every: usize,
}

impl Settings {
    /// Label for the track layer
    pub fn track_label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        self.track
            .as_ref()
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Track".to_string())
    }
}
