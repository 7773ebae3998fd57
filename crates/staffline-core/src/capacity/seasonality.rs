//! Seasonality and anomaly detection
//!
//! Observations are grouped by calendar month. Seasonality is present when the
//! variance of the monthly averages exceeds 10% of their mean; an individual
//! period is anomalous when it strays more than 20% from that mean.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{Anomaly, MonthlyAverage, Seasonality};

/// Variance threshold as a fraction of the overall average
const SEASONALITY_VARIANCE_RATIO: f64 = 0.10;
const PEAK_RATIO: f64 = 1.15;
const LOW_RATIO: f64 = 0.85;
/// Deviation threshold as a fraction of the overall average
const ANOMALY_RATIO: f64 = 0.20;

const ANOMALY_CAUSES: [&str; 4] = [
    "Project deadline clustering",
    "Holiday or leave period",
    "Unplanned staffing change",
    "Incomplete allocation data",
];

/// One value in a month-tagged series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalObservation {
    pub period: String,
    /// Calendar month (1-12)
    pub month: u32,
    pub value: f64,
}

/// Per-month averages, overall average and seasonal peaks/lows
pub fn detect_seasonality(observations: &[SeasonalObservation]) -> Seasonality {
    let mut by_month: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for obs in observations {
        let entry = by_month.entry(obs.month).or_insert((0.0, 0));
        entry.0 += obs.value;
        entry.1 += 1;
    }

    let monthly_averages: Vec<MonthlyAverage> = by_month
        .into_iter()
        .map(|(month, (sum, count))| MonthlyAverage {
            month,
            average: sum / count as f64,
        })
        .collect();

    if monthly_averages.is_empty() {
        return Seasonality {
            present: false,
            overall_average: 0.0,
            variance: 0.0,
            monthly_averages,
            peak_months: vec![],
            low_months: vec![],
        };
    }

    let count = monthly_averages.len() as f64;
    let overall_average = monthly_averages.iter().map(|m| m.average).sum::<f64>() / count;
    let variance = monthly_averages
        .iter()
        .map(|m| (m.average - overall_average).powi(2))
        .sum::<f64>()
        / count;

    let present = overall_average > 0.0 && variance > SEASONALITY_VARIANCE_RATIO * overall_average;

    let peak_months = monthly_averages
        .iter()
        .filter(|m| m.average > overall_average * PEAK_RATIO)
        .map(|m| m.month)
        .collect();
    let low_months = monthly_averages
        .iter()
        .filter(|m| m.average < overall_average * LOW_RATIO)
        .map(|m| m.month)
        .collect();

    Seasonality {
        present,
        overall_average,
        variance,
        monthly_averages,
        peak_months,
        low_months,
    }
}

/// Periods deviating from `overall_average` by more than 20% of it
pub fn detect_anomalies(observations: &[SeasonalObservation], overall_average: f64) -> Vec<Anomaly> {
    if overall_average <= 0.0 {
        return vec![];
    }

    let threshold = overall_average * ANOMALY_RATIO;
    observations
        .iter()
        .filter(|obs| (obs.value - overall_average).abs() > threshold)
        .map(|obs| Anomaly {
            period: obs.period.clone(),
            actual_utilization: obs.value,
            expected_utilization: overall_average,
            deviation: obs.value - overall_average,
            possible_causes: ANOMALY_CAUSES.iter().map(|c| c.to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(period: &str, month: u32, value: f64) -> SeasonalObservation {
        SeasonalObservation {
            period: period.to_string(),
            month,
            value,
        }
    }

    #[test]
    fn test_flat_year_has_no_seasonality() {
        let data: Vec<_> = (1..=12)
            .map(|m| obs(&format!("2025-{:02}", m), m, 75.0))
            .collect();

        let seasonality = detect_seasonality(&data);
        assert!(!seasonality.present);
        assert_eq!(seasonality.overall_average, 75.0);
        assert_eq!(seasonality.variance, 0.0);
        assert!(seasonality.peak_months.is_empty());
        assert!(seasonality.low_months.is_empty());
        assert!(detect_anomalies(&data, seasonality.overall_average).is_empty());
    }

    #[test]
    fn test_peak_and_low_months() {
        // Average 70: December 100 (> 80.5) is a peak, August 40 (< 59.5) is a low
        let mut data: Vec<_> = (1..=12)
            .filter(|m| *m != 8 && *m != 12)
            .map(|m| obs(&format!("2025-{:02}", m), m, 70.0))
            .collect();
        data.push(obs("2025-08", 8, 40.0));
        data.push(obs("2025-12", 12, 100.0));

        let seasonality = detect_seasonality(&data);
        assert!((seasonality.overall_average - 70.0).abs() < 1e-9);
        assert!(seasonality.present);
        assert_eq!(seasonality.peak_months, vec![12]);
        assert_eq!(seasonality.low_months, vec![8]);

        let anomalies = detect_anomalies(&data, seasonality.overall_average);
        let periods: Vec<_> = anomalies.iter().map(|a| a.period.as_str()).collect();
        assert_eq!(periods, vec!["2025-08", "2025-12"]);
        assert!((anomalies[1].deviation - 30.0).abs() < 1e-9);
        assert!(!anomalies[0].possible_causes.is_empty());
    }

    #[test]
    fn test_same_month_across_years_is_averaged() {
        let data = vec![obs("2024-03", 3, 60.0), obs("2025-03", 3, 80.0)];
        let seasonality = detect_seasonality(&data);
        assert_eq!(seasonality.monthly_averages.len(), 1);
        assert_eq!(seasonality.monthly_averages[0].average, 70.0);
    }

    #[test]
    fn test_empty_series() {
        let seasonality = detect_seasonality(&[]);
        assert!(!seasonality.present);
        assert!(seasonality.monthly_averages.is_empty());
        assert!(detect_anomalies(&[], 0.0).is_empty());
    }

    #[test]
    fn test_detection_is_repeatable() {
        let data = vec![
            obs("2025-01", 1, 50.0),
            obs("2025-02", 2, 90.0),
            obs("2025-03", 3, 65.0),
        ];
        let first = detect_seasonality(&data);
        let second = detect_seasonality(&data);
        assert_eq!(first, second);
        assert_eq!(
            detect_anomalies(&data, first.overall_average),
            detect_anomalies(&data, second.overall_average)
        );
    }
}
