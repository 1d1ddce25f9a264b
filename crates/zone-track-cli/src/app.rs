//! Loading inputs, building overlay groups, and writing them out
//!
//! The CLI, not the library, decides which groups are shown: every build
//! returns a fresh group and [`build_layers`] keeps them in an explicit list.

use crate::settings::{CalorieArgs, Layer, Settings};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use zone_track_lib::{
    CalorieParams, GeoJsonRenderer, OverlayConfig, OverlayError, OverlayGroup, PoiVariant,
    PointOfInterest, TrackPoint, build_points, estimate_calories_runs, normalize_runs,
    points_of_interest_from_gpx, raw_runs_from_gpx, read_gpx, read_points_of_interest,
    read_raw_points, resting_rate_mifflin_st_jeor,
};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error("{path}: {source}")]
    Input {
        path: String,
        #[source]
        source: OverlayError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Nothing to render: pass --track, --photos or --candidates")]
    NothingToRender,

    #[error("--summary needs --track")]
    SummaryWithoutTrack,

    #[error("--body-mass needs --rmr, or --height and --age")]
    MissingRestingRate,
}

/// Input file flavour, chosen by extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Gpx,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gpx") => InputFormat::Gpx,
            _ => InputFormat::Json,
        }
    }
}

pub fn run(settings: &Settings) -> Result<(), CliError> {
    if settings.track.is_none() && settings.photos.is_empty() && settings.candidates.is_empty() {
        return Err(CliError::NothingToRender);
    }

    let config = load_config(settings)?;
    tracing::debug!(
        "Colouring by {:?} with {} zones",
        config.metric_key,
        config.thresholds.zone_count()
    );

    let document = if settings.summary {
        let path = settings
            .track
            .as_deref()
            .ok_or(CliError::SummaryWithoutTrack)?;
        let runs = load_track(path)?;
        let mut report = serde_json::to_value(config.summarize_runs(&runs))?;
        if let Some(params) = calorie_params(&settings.calories)? {
            let estimate = estimate_calories_runs(&runs, &params)?;
            tracing::info!("Estimated {:.0} kcal", estimate.kilocalories);
            report["calories"] = serde_json::to_value(estimate)?;
        }
        report
    } else {
        let layers = build_layers(settings, &config)?;
        let mut renderer = GeoJsonRenderer::with_zone_labels(config.thresholds.clone());
        Value::Array(
            layers
                .iter()
                .map(|(_, group)| group.render(&mut renderer))
                .collect(),
        )
    };

    write_output(settings.output.as_deref(), &document)
}

fn load_config(settings: &Settings) -> Result<OverlayConfig, CliError> {
    let mut config = match &settings.config {
        Some(path) => OverlayConfig::from_file(path).map_err(|e| input_error(path, e))?,
        None => OverlayConfig::default(),
    };
    if let Some(metric) = &settings.metric {
        config.metric_key = metric.clone();
        config.validate()?;
    }
    Ok(config)
}

/// Build the requested layers in the requested order
///
/// Layers without input are skipped.
pub fn build_layers(
    settings: &Settings,
    config: &OverlayConfig,
) -> Result<Vec<(Layer, OverlayGroup)>, CliError> {
    let mut layers = Vec::new();

    for &layer in &settings.layers {
        let group = match layer {
            Layer::Track => match &settings.track {
                Some(path) => config
                    .build_track_runs(&load_track(path)?, &settings.track_label())
                    .map_err(|e| input_error(path, e))?,
                None => continue,
            },
            Layer::Photos if !settings.photos.is_empty() => {
                build_marker_layer(&settings.photos, PoiVariant::Standard)?
            }
            Layer::Candidates if !settings.candidates.is_empty() => {
                build_marker_layer(&settings.candidates, PoiVariant::Flagged)?
            }
            Layer::Photos | Layer::Candidates => continue,
        };

        let group = if settings.coalesce {
            group.coalesced()
        } else {
            group
        };
        tracing::info!("Layer {:?}: {} primitives", layer, group.len());
        layers.push((layer, group));
    }

    Ok(layers)
}

/// Points of interest of all `paths` as one group
///
/// A rejected record is reported with its own file and its index in that file.
fn build_marker_layer(
    paths: &[PathBuf],
    variant: PoiVariant,
) -> Result<OverlayGroup, CliError> {
    let mut pois: Vec<PointOfInterest> = Vec::new();
    let mut starts = Vec::with_capacity(paths.len());
    for path in paths {
        starts.push(pois.len());
        pois.extend(load_points_of_interest(path)?);
    }

    build_points(&pois, variant).map_err(|e| match e {
        OverlayError::Validation { index, issue } => {
            // Empty files share their start with the next file, so take the last match
            match paths.iter().zip(&starts).rev().find(|&(_, &start)| start <= index) {
                Some((path, &start)) => input_error(
                    path,
                    OverlayError::Validation {
                        index: index - start,
                        issue,
                    },
                ),
                None => OverlayError::Validation { index, issue }.into(),
            }
        }
        other => other.into(),
    })
}

/// Validated track points, one run per recorded segment
fn load_track(path: &Path) -> Result<Vec<Vec<TrackPoint>>, CliError> {
    tracing::info!("Reading track from {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let raw = match InputFormat::from_path(path) {
        InputFormat::Gpx => read_gpx(reader).map(|gpx| raw_runs_from_gpx(&gpx)),
        InputFormat::Json => read_raw_points(reader).map(|points| vec![points]),
    };
    raw.and_then(|runs| normalize_runs(&runs))
        .map_err(|e| input_error(path, e))
}

fn load_points_of_interest(path: &Path) -> Result<Vec<PointOfInterest>, CliError> {
    tracing::info!("Reading points of interest from {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let pois = match InputFormat::from_path(path) {
        InputFormat::Gpx => read_gpx(reader).map(|gpx| points_of_interest_from_gpx(&gpx)),
        InputFormat::Json => read_points_of_interest(reader),
    };
    pois.map_err(|e| input_error(path, e))
}

fn calorie_params(args: &CalorieArgs) -> Result<Option<CalorieParams>, CliError> {
    let Some(body_mass) = args.body_mass else {
        return Ok(None);
    };
    let resting_rate = match (args.rmr, args.height, args.age) {
        (Some(rmr), _, _) => rmr,
        (None, Some(height), Some(age)) => {
            resting_rate_mifflin_st_jeor(body_mass, height, age, args.male)
        }
        _ => return Err(CliError::MissingRestingRate),
    };
    Ok(Some(
        CalorieParams::new(body_mass, resting_rate)
            .with_pack(args.pack_start, args.pack_end)
            .with_every(args.every),
    ))
}

fn input_error(path: &Path, source: OverlayError) -> CliError {
    CliError::Input {
        path: path.display().to_string(),
        source,
    }
}

fn write_output(path: Option<&Path>, document: &Value) -> Result<(), CliError> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, document)?;
            writer.flush()?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, document)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
