//! Utilization predictions
//!
//! A line is fitted to the monthly utilization history and extrapolated per
//! scenario by scaling its slope. Without any history a fixed set of default
//! predictions is returned, tagged as fallback.

use chrono::{Months, NaiveDate};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::gateway::CapacitySnapshotRow;
use super::trend::{bucket_offsets, linear_regression_at};
use super::types::{
    DataBasis, Granularity, PredictedPoint, Prediction, PredictionOptions, PredictionScenario,
};

/// Monthly periods required for a fitted prediction
pub const MIN_PREDICTION_PERIODS: usize = 3;
/// Confidence (percent) of the default realistic prediction
pub const DEFAULT_REALISTIC_CONFIDENCE: f64 = 70.0;
/// Confidence (percent) of the other default predictions
pub const DEFAULT_OTHER_CONFIDENCE: f64 = 60.0;

impl PredictionScenario {
    /// Factor applied to the fitted slope
    pub fn slope_multiplier(&self) -> f64 {
        match self {
            PredictionScenario::Optimistic => 0.5,
            PredictionScenario::Realistic => 1.0,
            PredictionScenario::Pessimistic => 1.5,
        }
    }
}

fn month_label(start: NaiveDate, offset: u32) -> String {
    start
        .checked_add_months(Months::new(offset))
        .unwrap_or(start)
        .format("%Y-%m")
        .to_string()
}

/// Flat predictions at `baseline` used when there is no history
pub fn generate_default_predictions(
    scenarios: &[PredictionScenario],
    horizon: u32,
    start: NaiveDate,
    baseline: f64,
) -> Vec<Prediction> {
    let baseline = baseline.clamp(0.0, 100.0);
    scenarios
        .iter()
        .map(|scenario| Prediction {
            scenario: *scenario,
            horizon_months: horizon,
            predicted_utilization: baseline,
            points: (1..=horizon)
                .map(|step| PredictedPoint {
                    period: month_label(start, step),
                    utilization: baseline,
                })
                .collect(),
            confidence: match scenario {
                PredictionScenario::Realistic => DEFAULT_REALISTIC_CONFIDENCE,
                _ => DEFAULT_OTHER_CONFIDENCE,
            },
            basis: DataBasis::Fallback,
        })
        .collect()
}

/// Confidence in percent: fit quality less a penalty per month of horizon
fn fitted_confidence(r_squared: f64, horizon: u32, scenario: PredictionScenario) -> f64 {
    let scenario_penalty = match scenario {
        PredictionScenario::Realistic => 0.0,
        _ => 10.0,
    };
    (50.0 + 45.0 * r_squared - 3.0 * horizon as f64 - scenario_penalty).clamp(5.0, 95.0)
}

/// Predict utilization for each requested scenario
///
/// `history` is the chronological monthly series. An empty series yields the
/// default predictions around `fallback_utilization` starting after `today`.
pub fn predict_utilization(
    history: &[CapacitySnapshotRow],
    options: &PredictionOptions,
    today: NaiveDate,
    fallback_utilization: f64,
) -> Result<Vec<Prediction>> {
    if history.is_empty() {
        warn!("No utilization history, returning default predictions");
        return Ok(generate_default_predictions(
            &options.scenarios,
            options.horizon,
            today,
            fallback_utilization,
        ));
    }
    if history.len() < MIN_PREDICTION_PERIODS {
        return Err(Error::InsufficientData {
            required: MIN_PREDICTION_PERIODS,
            available: history.len(),
        });
    }

    let starts: Vec<NaiveDate> = history.iter().map(|r| r.bucket_start).collect();
    let offsets = bucket_offsets(&starts, Granularity::Monthly);
    let points: Vec<(f64, f64)> = offsets
        .iter()
        .zip(history)
        .map(|(x, r)| (*x, r.avg_utilization))
        .collect();
    let fit = linear_regression_at(&points);
    let last_index = offsets.last().copied().unwrap_or(0.0);
    let anchor = fit.predict(last_index);
    let last_bucket = history
        .last()
        .map(|r| r.bucket_start)
        .unwrap_or(today);

    let predictions: Vec<Prediction> = options
        .scenarios
        .iter()
        .map(|scenario| {
            let slope = fit.slope * scenario.slope_multiplier();
            let points: Vec<PredictedPoint> = (1..=options.horizon)
                .map(|step| PredictedPoint {
                    period: month_label(last_bucket, step),
                    utilization: (anchor + slope * step as f64).clamp(0.0, 100.0),
                })
                .collect();
            Prediction {
                scenario: *scenario,
                horizon_months: options.horizon,
                predicted_utilization: points
                    .last()
                    .map(|p| p.utilization)
                    .unwrap_or_else(|| anchor.clamp(0.0, 100.0)),
                points,
                confidence: fitted_confidence(fit.r_squared, options.horizon, *scenario),
                basis: DataBasis::Measured,
            }
        })
        .collect();

    debug!(
        periods = points.len(),
        slope = fit.slope,
        r_squared = fit.r_squared,
        scenarios = predictions.len(),
        "Predicted utilization"
    );

    Ok(predictions)
}

/// Reject a horizon of zero or beyond `max` months
pub fn validate_horizon(horizon: u32, max: u32) -> Result<u32> {
    if !(1..=max).contains(&horizon) {
        return Err(Error::InvalidData(format!(
            "horizon must be within 1-{} months, got {}",
            max, horizon
        )));
    }
    Ok(horizon)
}

/// Parse scenario names, rejecting unknown ones
pub fn parse_scenarios(names: &[String]) -> Result<Vec<PredictionScenario>> {
    if names.is_empty() {
        return Ok(PredictionScenario::all());
    }
    names
        .iter()
        .map(|name| name.parse::<PredictionScenario>().map_err(Error::InvalidData))
        .collect()
}
