//! Trend estimator
//!
//! Ordinary-least-squares fit of a series against its period index. Series
//! built from stored buckets are indexed by their distance from the first
//! bucket, so empty periods keep their place on the axis. This is the only
//! trend computation in the engine; skill trends, capacity trends and
//! predictions all go through it.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::types::{Granularity, TrendAnalysis, TrendDirection};

/// Slopes within this distance of zero count as stable
pub const STABLE_SLOPE_TOLERANCE: f64 = 0.1;

/// Fitted line `y = intercept + slope * index`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, clamped to 0-1
    pub r_squared: f64,
}

impl Regression {
    /// Value of the fitted line at a (possibly fractional) period index
    pub fn predict(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }
}

/// Fit an OLS line to equally spaced observations
///
/// Fewer than two points yields a flat line (slope 0) through the single
/// value, or through zero for an empty series.
pub fn linear_regression(values: &[f64]) -> Regression {
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, y)| (i as f64, *y))
        .collect();
    linear_regression_at(&points)
}

/// Fit an OLS line to `(index, value)` observations
///
/// Indices need not be contiguous. When every observation shares one index
/// the fit is a flat line through the mean.
pub fn linear_regression_at(points: &[(f64, f64)]) -> Regression {
    let n = points.len();
    if n < 2 {
        return Regression {
            slope: 0.0,
            intercept: points.first().map(|(_, y)| *y).unwrap_or(0.0),
            r_squared: 0.0,
        };
    }

    let n_f = n as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n_f;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n_f;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in points {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }

    if sxx <= f64::EPSILON {
        return Regression {
            slope: 0.0,
            intercept: mean_y,
            r_squared: 0.0,
        };
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let mut ss_tot = 0.0;
    let mut ss_res = 0.0;
    for (x, y) in points {
        let fitted = intercept + slope * x;
        ss_tot += (y - mean_y).powi(2);
        ss_res += (y - fitted).powi(2);
    }

    let r_squared = if ss_tot > f64::EPSILON {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        // A constant series is fitted exactly by a flat line
        1.0
    };

    Regression {
        slope,
        intercept,
        r_squared,
    }
}

/// Period index of each bucket start, counted from the first bucket
///
/// Missing buckets leave gaps in the indices, so a January, February, June
/// series maps to 0, 1, 5.
pub fn bucket_offsets(starts: &[NaiveDate], granularity: Granularity) -> Vec<f64> {
    let Some(first) = starts.first().copied() else {
        return vec![];
    };
    starts
        .iter()
        .map(|start| match granularity {
            Granularity::Monthly => {
                let months = (start.year() - first.year()) * 12 + start.month() as i32
                    - first.month() as i32;
                months as f64
            }
            Granularity::Weekly => ((*start - first).num_days() as f64 / 7.0).round(),
        })
        .collect()
}

/// Direction implied by a slope
pub fn classify_trend(slope: f64) -> TrendDirection {
    if slope > STABLE_SLOPE_TOLERANCE {
        TrendDirection::Increasing
    } else if slope < -STABLE_SLOPE_TOLERANCE {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

/// Fit and classify a series in one step
pub fn analyze_trend(values: &[f64]) -> TrendAnalysis {
    trend_of(linear_regression(values), values.len())
}

/// Fit and classify a series of `(index, value)` observations
pub fn analyze_trend_at(points: &[(f64, f64)]) -> TrendAnalysis {
    trend_of(linear_regression_at(points), points.len())
}

fn trend_of(fit: Regression, periods: usize) -> TrendAnalysis {
    TrendAnalysis {
        direction: classify_trend(fit.slope),
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared,
        periods,
    }
}
