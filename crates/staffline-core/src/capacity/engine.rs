//! Capacity Engine - orchestrates the analyzers over a gateway
//!
//! The engine holds no mutable state. Each operation fetches what it needs
//! from the injected gateway, issuing independent reads concurrently, and runs
//! the pure analyzers over the fetched rows.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};

use super::bottlenecks::{current_bottlenecks, historical_bottlenecks, predicted_bottlenecks};
use super::gateway::{AllocationFilter, BottleneckFilter, CapacityGateway};
use super::optimizer::optimize;
use super::predictions::{generate_default_predictions, predict_utilization, validate_horizon};
use super::recommendations::{assess_risk_factors, build_recommendations};
use super::scenario::{simulate, ScenarioBaseline};
use super::seasonality::{detect_anomalies, detect_seasonality, SeasonalObservation};
use super::skills::{forecast_skills, SkillInputs};
use super::trend::{analyze_trend, analyze_trend_at, bucket_offsets};
use super::types::{
    AllocationRecord, BottleneckReport, BottleneckStatus, CapacityIntelligence, CapacityTrendPoint,
    CapacityTrends, DataBasis, DateRange, Granularity, IntelligenceFilters, OptimizationResult,
    PatternOptions, Prediction, PredictionOptions, PredictionScenario, ScenarioRequest,
    ScenarioResult, Severity, SkillForecastReport, UtilizationPatterns, UtilizationSnapshot,
};
use super::utilization::compute_utilization;

/// Section names reported in `degraded_sections`
pub const SECTION_UTILIZATION: &str = "current_utilization";
pub const SECTION_TRENDS: &str = "capacity_trends";
pub const SECTION_BOTTLENECKS: &str = "bottleneck_analysis";
pub const SECTION_PREDICTIONS: &str = "predictions";

/// The capacity analytics engine
pub struct CapacityEngine<G> {
    gateway: G,
    config: EngineConfig,
    reference_date: Option<NaiveDate>,
}

impl<G: CapacityGateway> CapacityEngine<G> {
    pub fn new(gateway: G, config: EngineConfig) -> Self {
        Self {
            gateway,
            config,
            reference_date: None,
        }
    }

    /// Pin "today" to a fixed date
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn now(&self) -> DateTime<Utc> {
        match self.reference_date {
            Some(date) => Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
            None => Utc::now(),
        }
    }

    fn default_window(&self) -> DateRange {
        DateRange::trailing_days(self.today(), self.config.current_window_days)
    }

    fn current_window(&self, window_days: Option<i64>) -> Result<DateRange> {
        let days = window_days.unwrap_or(self.config.current_window_days);
        if !(1..=self.config.max_window_days).contains(&days) {
            return Err(Error::InvalidData(format!(
                "window_days must be within 1-{}, got {}",
                self.config.max_window_days, days
            )));
        }
        Ok(DateRange::trailing_days(self.today(), days))
    }

    fn default_prediction_options(&self) -> PredictionOptions {
        PredictionOptions {
            horizon: self.config.prediction_horizon,
            scenarios: PredictionScenario::all(),
        }
    }

    /// Utilization over the current window, optionally for one department
    pub async fn current_utilization(
        &self,
        department: Option<&str>,
        window_days: Option<i64>,
    ) -> Result<UtilizationSnapshot> {
        let range = self.current_window(window_days)?;
        let workforce = self
            .gateway
            .fetch_workforce(range, &AllocationFilter::department(department))
            .await?;
        Ok(compute_utilization(&workforce, range, &self.config))
    }

    /// Monthly capacity history over `months` with fitted trends
    pub async fn capacity_trends(&self, months: Option<u32>) -> Result<CapacityTrends> {
        let months = months.unwrap_or(self.config.trend_lookback_months);
        let range = DateRange::trailing_months(self.today(), months);
        let rows = self
            .gateway
            .fetch_capacity_snapshots(range, Granularity::Monthly)
            .await?;

        let points: Vec<CapacityTrendPoint> = rows
            .iter()
            .map(|r| CapacityTrendPoint {
                period: r.period.clone(),
                utilization: r.avg_utilization,
                capacity: r.avg_capacity,
                demand: r.avg_demand,
            })
            .collect();

        let starts: Vec<NaiveDate> = rows.iter().map(|r| r.bucket_start).collect();
        let offsets = bucket_offsets(&starts, Granularity::Monthly);
        let utilization: Vec<(f64, f64)> = offsets
            .iter()
            .zip(&points)
            .map(|(x, p)| (*x, p.utilization))
            .collect();
        let demand: Vec<(f64, f64)> = offsets
            .iter()
            .zip(&points)
            .map(|(x, p)| (*x, p.demand))
            .collect();

        Ok(CapacityTrends {
            utilization_trend: analyze_trend_at(&utilization),
            demand_trend: analyze_trend_at(&demand),
            basis: if points.is_empty() {
                DataBasis::Fallback
            } else {
                DataBasis::Measured
            },
            points,
        })
    }

    /// Current, predicted and historical bottlenecks
    pub async fn identify_bottlenecks(&self, severity: Option<Severity>) -> Result<BottleneckReport> {
        let today = self.today();
        let history_start = today
            .checked_sub_months(chrono::Months::new(self.config.historical_bottleneck_months))
            .unwrap_or(today);

        let active_filter = BottleneckFilter {
            status: Some(BottleneckStatus::Active),
            severity,
            since: None,
        };
        let resolved_filter = BottleneckFilter {
            status: Some(BottleneckStatus::Resolved),
            severity,
            since: Some(history_start),
        };

        let (current_rows, predicted_rows, resolved_rows) = tokio::try_join!(
            self.gateway.fetch_bottlenecks(&active_filter),
            self.gateway.fetch_bottlenecks(&active_filter),
            self.gateway.fetch_bottlenecks(&resolved_filter),
        )?;

        let report = BottleneckReport {
            current: current_bottlenecks(&current_rows, severity),
            predicted: predicted_bottlenecks(&predicted_rows, severity, self.now()),
            historical: historical_bottlenecks(
                &resolved_rows,
                severity,
                history_start,
                self.config.historical_bottleneck_limit,
            ),
            basis: DataBasis::Measured,
        };

        debug!(
            current = report.current.len(),
            predicted = report.predicted.len(),
            historical = report.historical.len(),
            "Identified bottlenecks"
        );
        Ok(report)
    }

    /// Utilization predictions per scenario
    pub async fn get_capacity_predictions(&self, options: &PredictionOptions) -> Result<Vec<Prediction>> {
        validate_horizon(options.horizon, self.config.max_prediction_horizon)?;
        let range = DateRange::trailing_months(self.today(), self.config.trend_lookback_months);
        let history = self
            .gateway
            .fetch_capacity_snapshots(range, Granularity::Monthly)
            .await?;
        predict_utilization(
            &history,
            options,
            self.today(),
            self.config.fallback_utilization,
        )
    }

    /// Simulate a what-if scenario against the current baseline
    pub async fn run_scenario_analysis(&self, request: &ScenarioRequest) -> Result<ScenarioResult> {
        let options = &request.analysis_options;
        let active = BottleneckFilter {
            status: Some(BottleneckStatus::Active),
            ..Default::default()
        };
        let (utilization, bottlenecks) = tokio::try_join!(
            self.current_utilization(options.department.as_deref(), options.window_days),
            self.gateway.fetch_bottlenecks(&active),
        )?;

        let baseline = ScenarioBaseline {
            utilization,
            bottlenecks: current_bottlenecks(&bottlenecks, None),
        };
        let scenario_id = uuid::Uuid::new_v4().to_string();
        let result = simulate(scenario_id, &baseline, &request.changes, &self.config);

        for warning in &result.warnings {
            warn!(scenario = %result.scenario_id, "{}", warning);
        }
        Ok(result)
    }

    /// Seasonality, trend and anomalies over a utilization history
    pub async fn analyze_utilization_patterns(&self, options: &PatternOptions) -> Result<UtilizationPatterns> {
        let range = DateRange::trailing_months(self.today(), options.period_months);
        let rows = self
            .gateway
            .fetch_capacity_snapshots(range, options.granularity)
            .await?;

        let observations: Vec<SeasonalObservation> = rows
            .iter()
            .map(|r| SeasonalObservation {
                period: r.period.clone(),
                month: chrono::Datelike::month(&r.bucket_start),
                value: r.avg_utilization,
            })
            .collect();
        let starts: Vec<NaiveDate> = rows.iter().map(|r| r.bucket_start).collect();
        let points: Vec<(f64, f64)> = bucket_offsets(&starts, options.granularity)
            .into_iter()
            .zip(observations.iter().map(|o| o.value))
            .collect();

        let seasonality = detect_seasonality(&observations);
        let anomalies = detect_anomalies(&observations, seasonality.overall_average);

        debug!(
            periods = rows.len(),
            seasonal = seasonality.present,
            anomalies = anomalies.len(),
            "Analyzed utilization patterns"
        );

        Ok(UtilizationPatterns {
            patterns: rows
                .into_iter()
                .map(|r| CapacityTrendPoint {
                    period: r.period,
                    utilization: r.avg_utilization,
                    capacity: r.avg_capacity,
                    demand: r.avg_demand,
                })
                .collect(),
            trends: analyze_trend_at(&points),
            seasonality,
            anomalies,
        })
    }

    /// Skill supply vs demand forecast over `horizon` months
    pub async fn forecast_skill_demand(&self, horizon: u32) -> Result<SkillForecastReport> {
        let horizon = validate_horizon(horizon, self.config.max_prediction_horizon)?;
        let today = self.today();
        let history_range = DateRange::trailing_months(today, self.config.trend_lookback_months);
        let workforce_range = self.default_window();
        let everyone = AllocationFilter::default();

        let (supply, demand, history, workforce) = tokio::try_join!(
            self.gateway.fetch_skill_supply(),
            self.gateway.fetch_skill_demand(),
            self.gateway.fetch_skill_history(history_range),
            self.gateway.fetch_workforce(workforce_range, &everyone),
        )?;

        forecast_skills(
            SkillInputs {
                supply: &supply,
                demand: &demand,
                history: &history,
                workforce: &workforce,
                workforce_weeks: workforce_range.weeks(),
            },
            horizon,
        )
    }

    /// Rank corrective actions for the given allocations, or the current ones
    pub async fn optimize_allocation(
        &self,
        allocations: Option<Vec<AllocationRecord>>,
    ) -> Result<OptimizationResult> {
        let records = match allocations {
            Some(records) => records,
            None => {
                self.gateway
                    .fetch_allocation_records(self.default_window(), &AllocationFilter::default())
                    .await?
            }
        };
        Ok(optimize(&records, self.config.max_suggestions))
    }

    /// Full intelligence report
    ///
    /// Sections are computed concurrently. A section whose query fails is
    /// replaced by a fallback, logged, and named in `degraded_sections`.
    pub async fn get_capacity_intelligence(
        &self,
        filters: &IntelligenceFilters,
    ) -> Result<CapacityIntelligence> {
        let prediction_options = self.default_prediction_options();
        let (utilization, trends, bottlenecks, predictions) = tokio::join!(
            self.current_utilization(filters.department.as_deref(), None),
            self.capacity_trends(filters.timeframe_months),
            self.identify_bottlenecks(None),
            self.get_capacity_predictions(&prediction_options),
        );

        let mut degraded = Vec::new();

        let current_utilization = utilization.unwrap_or_else(|e| {
            warn!(section = SECTION_UTILIZATION, error = %e, "Using fallback");
            degraded.push(SECTION_UTILIZATION.to_string());
            compute_utilization(&[], self.default_window(), &self.config)
        });

        let capacity_trends = trends.unwrap_or_else(|e| {
            warn!(section = SECTION_TRENDS, error = %e, "Using fallback");
            degraded.push(SECTION_TRENDS.to_string());
            CapacityTrends {
                points: vec![],
                utilization_trend: analyze_trend(&[]),
                demand_trend: analyze_trend(&[]),
                basis: DataBasis::Fallback,
            }
        });

        let bottleneck_analysis = bottlenecks.unwrap_or_else(|e| {
            warn!(section = SECTION_BOTTLENECKS, error = %e, "Using fallback");
            degraded.push(SECTION_BOTTLENECKS.to_string());
            BottleneckReport {
                basis: DataBasis::Fallback,
                ..Default::default()
            }
        });

        let predictions = predictions.unwrap_or_else(|e| {
            warn!(section = SECTION_PREDICTIONS, error = %e, "Using fallback");
            degraded.push(SECTION_PREDICTIONS.to_string());
            generate_default_predictions(
                &prediction_options.scenarios,
                prediction_options.horizon,
                self.today(),
                self.config.fallback_utilization,
            )
        });

        let recommendations =
            build_recommendations(&current_utilization, &bottleneck_analysis, &capacity_trends);
        let risk_factors =
            assess_risk_factors(&current_utilization, &bottleneck_analysis, &capacity_trends);

        info!(
            utilization = current_utilization.overall,
            recommendations = recommendations.len(),
            degraded = degraded.len(),
            "Built capacity intelligence report"
        );

        Ok(CapacityIntelligence {
            current_utilization,
            capacity_trends,
            bottleneck_analysis,
            predictions,
            recommendations,
            risk_factors,
            degraded_sections: degraded,
        })
    }
}
