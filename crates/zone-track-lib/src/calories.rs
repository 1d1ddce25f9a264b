//! Energy expenditure of walking a track
//!
//! Each step between two timed points is costed with the Ludlow and Weyand
//! walking model (oxygen uptake from grade and speed) and converted at
//! 5 kcal per litre of oxygen. A pack that is emptied along the way (food,
//! water) is modelled as a mass that drops linearly from start to end.

use crate::{OverlayError, Result, TrackPoint, utils};
use serde::Serialize;

const KCAL_PER_LITRE_O2: f64 = 5.0;

// Ludlow & Weyand coefficients, ml O2 / kg / min
const C1: f64 = 0.32;
const WALK_MINIMUM: f64 = 3.28;
const C2: f64 = 0.19;
const C3: f64 = 2.66;
const C_DECLINE: f64 = 0.73;

/// Walker and load for a calorie estimate
#[derive(Clone, Debug, PartialEq)]
pub struct CalorieParams {
    pub body_mass_kg: f64,
    pub pack_start_kg: f64,
    pub pack_end_kg: f64,
    /// Resting metabolic rate in ml O2 per kg per minute
    pub resting_rate: f64,
    /// Cost every n-th point only; 1 uses all of them
    pub every: usize,
}

impl CalorieParams {
    /// No pack, every point
    pub fn new(body_mass_kg: f64, resting_rate: f64) -> Self {
        Self {
            body_mass_kg,
            pack_start_kg: 0.0,
            pack_end_kg: 0.0,
            resting_rate,
            every: 1,
        }
    }

    pub fn with_pack(mut self, start_kg: f64, end_kg: f64) -> Self {
        self.pack_start_kg = start_kg;
        self.pack_end_kg = end_kg;
        self
    }

    pub fn with_every(mut self, every: usize) -> Self {
        self.every = every;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |what: &str, value: f64| {
            OverlayError::Configuration(format!("{what} must be a positive number, got {value}"))
        };
        if !(self.body_mass_kg.is_finite() && self.body_mass_kg > 0.0) {
            return Err(invalid("body mass", self.body_mass_kg));
        }
        if !(self.resting_rate.is_finite() && self.resting_rate > 0.0) {
            return Err(invalid("resting metabolic rate", self.resting_rate));
        }
        for (what, mass) in [
            ("pack start mass", self.pack_start_kg),
            ("pack end mass", self.pack_end_kg),
        ] {
            if !(mass.is_finite() && mass >= 0.0) {
                return Err(OverlayError::Configuration(format!(
                    "{what} must not be negative, got {mass}"
                )));
            }
        }
        if self.every == 0 {
            return Err(OverlayError::Configuration(
                "point step must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resting metabolic rate from the Mifflin-St Jeor equation
///
/// Returns ml O2 per kg per minute, the unit [`CalorieParams::resting_rate`]
/// expects.
pub fn resting_rate_mifflin_st_jeor(
    body_mass_kg: f64,
    height_cm: f64,
    age_years: f64,
    male: bool,
) -> f64 {
    let sex_offset = if male { 5.0 } else { -161.0 };
    let kcal_per_day = 10.0 * body_mass_kg + 6.25 * height_cm - 5.0 * age_years + sex_offset;
    let litres_per_minute = kcal_per_day / KCAL_PER_LITRE_O2 / (24.0 * 60.0);
    litres_per_minute / body_mass_kg * 1000.0
}

/// Oxygen uptake in ml O2 per kg per minute
///
/// `grade` is in percent, `speed` in metres per second. Downhill grades are
/// costed as level ground plus a fixed decline term.
fn oxygen_cost(grade: f64, speed: f64, resting_rate: f64) -> f64 {
    let (grade, decline) = if grade < 0.0 {
        (0.0, C_DECLINE)
    } else {
        (grade, 0.0)
    };
    resting_rate + C1 * grade + WALK_MINIMUM + (1.0 + C2 * grade) * (C3 * speed * speed) + decline
}

/// Result of [`estimate_calories`]
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CalorieEstimate {
    pub kilocalories: f64,
    /// Steps that were costed
    pub steps: usize,
    /// Steps without a usable time difference
    pub skipped_steps: usize,
}

/// Estimate the energy spent walking `points`
pub fn estimate_calories(
    points: &[TrackPoint],
    params: &CalorieParams,
) -> Result<CalorieEstimate> {
    estimate_calories_runs(&[points], params)
}

/// Estimate the energy spent walking a track recorded in separate runs
///
/// Gaps between runs are not walked. The pack mass still drops per point
/// across the whole track.
pub fn estimate_calories_runs<R: AsRef<[TrackPoint]>>(
    runs: &[R],
    params: &CalorieParams,
) -> Result<CalorieEstimate> {
    #[cfg(feature = "profiling")]
    profiling::scope!("calories::estimate_calories");

    params.validate()?;

    let total_points: usize = runs.iter().map(|run| run.as_ref().len()).sum();
    let mut estimate = CalorieEstimate::default();
    if total_points == 0 {
        return Ok(estimate);
    }
    let pack_loss_per_point = (params.pack_start_kg - params.pack_end_kg) / total_points as f64;

    let mut ordinal = 0;
    for run in runs {
        let mut last: Option<&TrackPoint> = None;
        for (index, point) in run.as_ref().iter().enumerate() {
            ordinal += 1;
            let Some(start) = last else {
                last = Some(point);
                continue;
            };
            if index % params.every != 0 {
                continue;
            }
            last = Some(point);

            let pack = params.pack_start_kg - pack_loss_per_point * (ordinal - 1) as f64;
            let mass = params.body_mass_kg + pack.max(0.0);
            match step_kilocalories(start, point, mass, params.resting_rate) {
                Some(kcal) => {
                    estimate.kilocalories += kcal;
                    estimate.steps += 1;
                }
                None => estimate.skipped_steps += 1,
            }
        }
    }

    tracing::debug!(
        "Estimated {:.0} kcal over {} steps ({} skipped)",
        estimate.kilocalories,
        estimate.steps,
        estimate.skipped_steps
    );
    Ok(estimate)
}

/// Energy of one step, `None` unless both points are timed and time advances
fn step_kilocalories(
    start: &TrackPoint,
    end: &TrackPoint,
    mass_kg: f64,
    resting_rate: f64,
) -> Option<f64> {
    let seconds = end.meta().time? - start.meta().time?;
    if !(seconds > 0.0) {
        return None;
    }

    let distance = utils::haversine_distance(start.position(), end.position());
    let grade = match (start.altitude(), end.altitude()) {
        (Some(from), Some(to)) if distance > 0.0 => (to - from) / distance * 100.0,
        _ => 0.0,
    };
    let speed = distance / seconds;

    let ml_per_minute = oxygen_cost(grade, speed, resting_rate) * mass_kg;
    Some(ml_per_minute / 1000.0 * KCAL_PER_LITRE_O2 * seconds / 60.0)
}
