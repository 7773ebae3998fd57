//! Capacity analytics handlers
//!
//! Thin adapters from query strings and JSON bodies onto `CapacityEngine`
//! operations. Every call is audit-logged with the parameters it ran with.

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::HeaderMap,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::{get_user_email, AppError, AppState};
use staffline_core::capacity::predictions::parse_scenarios;
use staffline_core::capacity::{
    AllocationRecord, BottleneckReport, CapacityIntelligence, Granularity, IntelligenceFilters,
    OptimizationResult, PatternOptions, Prediction, PredictionOptions, ScenarioRequest,
    ScenarioResult, Severity, SkillForecastReport, UtilizationPatterns, UtilizationSnapshot,
};
use staffline_core::DepartmentSnapshot;

/// Largest accepted request body for engine calls
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Read an optional JSON body; an empty body yields the default
async fn optional_json<T>(request: Request) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned + Default,
{
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes).map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))
}

fn require_positive(name: &str, value: Option<u32>) -> Result<Option<u32>, AppError> {
    match value {
        Some(0) => Err(AppError::bad_request(&format!("{} must be at least 1", name))),
        other => Ok(other),
    }
}

#[derive(Debug, Deserialize)]
pub struct IntelligenceQuery {
    pub department: Option<String>,
    pub timeframe_months: Option<u32>,
}

/// GET /api/capacity/intelligence - Full capacity intelligence report
pub async fn get_capacity_intelligence(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IntelligenceQuery>,
    request: Request,
) -> Result<Json<CapacityIntelligence>, AppError> {
    let user_email = get_user_email(request.headers());
    let filters = IntelligenceFilters {
        department: params.department,
        timeframe_months: require_positive("timeframe_months", params.timeframe_months)?,
    };

    let report = state.engine.get_capacity_intelligence(&filters).await?;

    state.db.log_audit(
        &user_email,
        "report",
        Some("capacity_intelligence"),
        None,
        Some(&format!(
            "department={:?}, timeframe_months={:?}, degraded={}",
            filters.department,
            filters.timeframe_months,
            report.degraded_sections.len()
        )),
    )?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct UtilizationQuery {
    pub department: Option<String>,
    pub window_days: Option<i64>,
}

/// GET /api/capacity/utilization - Utilization over the current window
pub async fn get_utilization(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UtilizationQuery>,
    request: Request,
) -> Result<Json<UtilizationSnapshot>, AppError> {
    let user_email = get_user_email(request.headers());

    let snapshot = state
        .engine
        .current_utilization(params.department.as_deref(), params.window_days)
        .await?;

    state.db.log_audit(
        &user_email,
        "report",
        Some("utilization"),
        None,
        Some(&format!(
            "department={:?}, overall={:.1}",
            params.department, snapshot.overall
        )),
    )?;

    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct PredictionsQuery {
    pub horizon: Option<u32>,
    /// Comma-separated scenario names
    pub scenarios: Option<String>,
}

/// GET /api/capacity/predictions - Utilization predictions per scenario
pub async fn get_predictions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PredictionsQuery>,
    request: Request,
) -> Result<Json<Vec<Prediction>>, AppError> {
    let user_email = get_user_email(request.headers());

    let names: Vec<String> = params
        .scenarios
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let options = PredictionOptions {
        horizon: require_positive("horizon", params.horizon)?
            .unwrap_or(state.engine.config().prediction_horizon),
        scenarios: parse_scenarios(&names)?,
    };

    let predictions = state.engine.get_capacity_predictions(&options).await?;

    state.db.log_audit(
        &user_email,
        "report",
        Some("predictions"),
        None,
        Some(&format!(
            "horizon={}, scenarios={}",
            options.horizon,
            options.scenarios.len()
        )),
    )?;

    Ok(Json(predictions))
}

#[derive(Debug, Deserialize)]
pub struct BottleneckQuery {
    pub severity: Option<String>,
}

/// GET /api/capacity/bottlenecks - Current, predicted and historical bottlenecks
pub async fn identify_bottlenecks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BottleneckQuery>,
    request: Request,
) -> Result<Json<BottleneckReport>, AppError> {
    let user_email = get_user_email(request.headers());

    let severity: Option<Severity> = params
        .severity
        .as_deref()
        .map(str::parse::<Severity>)
        .transpose()
        .map_err(|e: String| AppError::bad_request(&e))?;

    let report = state.engine.identify_bottlenecks(severity).await?;

    state.db.log_audit(
        &user_email,
        "report",
        Some("bottlenecks"),
        None,
        Some(&format!(
            "severity={:?}, current={}, predicted={}",
            severity,
            report.current.len(),
            report.predicted.len()
        )),
    )?;

    Ok(Json(report))
}

/// POST /api/capacity/scenarios - Run a what-if scenario
pub async fn run_scenario(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ScenarioRequest>,
) -> Result<Json<ScenarioResult>, AppError> {
    let user_email = get_user_email(&headers);

    if req.changes.is_empty() {
        return Err(AppError::bad_request("At least one change is required"));
    }

    let result = state.engine.run_scenario_analysis(&req).await?;

    state.db.log_audit(
        &user_email,
        "simulate",
        Some("scenario"),
        None,
        Some(&format!(
            "id={}, changes={}, warnings={}, risk={}",
            result.scenario_id,
            req.changes.len(),
            result.warnings.len(),
            result.risk_assessment.risk_level
        )),
    )?;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct PatternsQuery {
    pub period_months: Option<u32>,
    pub granularity: Option<String>,
}

/// GET /api/capacity/patterns - Seasonality, trend and anomalies
pub async fn get_patterns(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PatternsQuery>,
    request: Request,
) -> Result<Json<UtilizationPatterns>, AppError> {
    let user_email = get_user_email(request.headers());

    let defaults = PatternOptions::default();
    let granularity: Granularity = match params.granularity.as_deref() {
        Some(g) => g.parse().map_err(|e: String| AppError::bad_request(&e))?,
        None => defaults.granularity,
    };
    let options = PatternOptions {
        period_months: require_positive("period_months", params.period_months)?
            .unwrap_or(defaults.period_months),
        granularity,
    };

    let patterns = state.engine.analyze_utilization_patterns(&options).await?;

    state.db.log_audit(
        &user_email,
        "report",
        Some("patterns"),
        None,
        Some(&format!(
            "period_months={}, periods={}, anomalies={}",
            options.period_months,
            patterns.patterns.len(),
            patterns.anomalies.len()
        )),
    )?;

    Ok(Json(patterns))
}

#[derive(Debug, Deserialize)]
pub struct SkillsQuery {
    pub horizon: Option<u32>,
}

/// GET /api/capacity/skills/forecast - Skill demand forecast with gaps and actions
pub async fn forecast_skills(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SkillsQuery>,
    request: Request,
) -> Result<Json<SkillForecastReport>, AppError> {
    let user_email = get_user_email(request.headers());
    let horizon = require_positive("horizon", params.horizon)?
        .unwrap_or(state.engine.config().prediction_horizon);

    let report = state.engine.forecast_skill_demand(horizon).await?;

    state.db.log_audit(
        &user_email,
        "report",
        Some("skill_forecast"),
        None,
        Some(&format!(
            "horizon={}, gaps={}",
            horizon,
            report.skill_gaps.len()
        )),
    )?;

    Ok(Json(report))
}

/// Request body for allocation optimization
#[derive(Debug, Default, Deserialize)]
pub struct OptimizeRequest {
    /// Allocations to evaluate; the current ones when omitted
    pub allocations: Option<Vec<AllocationRecord>>,
}

/// POST /api/capacity/optimize - Suggest allocation corrections
pub async fn optimize_allocation(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<OptimizationResult>, AppError> {
    let user_email = get_user_email(request.headers());
    let req: OptimizeRequest = optional_json(request).await?;
    let supplied = req.allocations.as_ref().map(Vec::len);

    let result = state.engine.optimize_allocation(req.allocations).await?;

    state.db.log_audit(
        &user_email,
        "optimize",
        Some("allocation"),
        None,
        Some(&format!(
            "supplied={:?}, suggestions={}",
            supplied,
            result.suggestions.len()
        )),
    )?;

    Ok(Json(result))
}

/// Request body for recording a snapshot
#[derive(Debug, Default, Deserialize)]
pub struct SnapshotRequest {
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

/// POST /api/capacity/snapshots - Record today's (or a given day's) capacity snapshot
pub async fn record_snapshot(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<DepartmentSnapshot>>, AppError> {
    let user_email = get_user_email(request.headers());
    let req: SnapshotRequest = optional_json(request).await?;
    let date = req.date.unwrap_or_else(|| Local::now().date_naive());

    let snapshots = state.db.record_capacity_snapshot(date)?;

    state.db.log_audit(
        &user_email,
        "create",
        Some("capacity_snapshot"),
        None,
        Some(&format!("date={}, departments={}", date, snapshots.len())),
    )?;

    Ok(Json(snapshots))
}
