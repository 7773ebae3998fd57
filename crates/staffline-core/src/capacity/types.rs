//! Core types for the Capacity Engine

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Impact score at or above which a bottleneck is critical
pub const CRITICAL_IMPACT: f64 = 90.0;
/// Impact score at or above which a bottleneck is high severity
pub const HIGH_IMPACT: f64 = 70.0;
/// Impact score at or above which a bottleneck is medium severity
pub const MEDIUM_IMPACT: f64 = 40.0;

/// Severity of a bottleneck or skill gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    /// Band an impact score (0-100) into a severity
    ///
    /// Every bottleneck, mapped or synthesized, goes through this.
    pub fn from_impact(impact: f64) -> Self {
        if impact >= CRITICAL_IMPACT {
            Severity::Critical
        } else if impact >= HIGH_IMPACT {
            Severity::High
        } else if impact >= MEDIUM_IMPACT {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// What kind of capacity a bottleneck constrains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckType {
    Skill,
    Department,
    Resource,
    Time,
}

impl BottleneckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BottleneckType::Skill => "skill",
            BottleneckType::Department => "department",
            BottleneckType::Resource => "resource",
            BottleneckType::Time => "time",
        }
    }
}

impl fmt::Display for BottleneckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BottleneckType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skill" => Ok(BottleneckType::Skill),
            "department" => Ok(BottleneckType::Department),
            "resource" => Ok(BottleneckType::Resource),
            "time" => Ok(BottleneckType::Time),
            _ => Err(format!("Unknown bottleneck type: {}", s)),
        }
    }
}

/// Lifecycle status of a bottleneck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckStatus {
    Active,
    Predicted,
    Resolved,
}

impl BottleneckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BottleneckStatus::Active => "active",
            BottleneckStatus::Predicted => "predicted",
            BottleneckStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for BottleneckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BottleneckStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BottleneckStatus::Active),
            "predicted" => Ok(BottleneckStatus::Predicted),
            "resolved" => Ok(BottleneckStatus::Resolved),
            _ => Err(format!("Unknown bottleneck status: {}", s)),
        }
    }
}

/// Direction of a series over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk tier used by scenarios, suggestions and risk factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a value was computed from data or substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataBasis {
    #[default]
    Measured,
    /// Static stand-in used because data was missing or a query failed
    Fallback,
}

impl DataBasis {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DataBasis::Fallback)
    }
}

/// Bucket size for time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Weekly,
    #[default]
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" | "week" => Ok(Granularity::Weekly),
            "monthly" | "month" => Ok(Granularity::Monthly),
            _ => Err(format!("Unknown granularity: {} (use weekly or monthly)", s)),
        }
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// The `days` days ending on `end` (inclusive), clamped to the earliest
    /// representable date
    pub fn trailing_days(end: NaiveDate, days: i64) -> Self {
        let back = chrono::Days::new(days.max(1).unsigned_abs() - 1);
        Self {
            from: end.checked_sub_days(back).unwrap_or(NaiveDate::MIN),
            to: end,
        }
    }

    /// Whole months ending with the month containing `end`
    pub fn trailing_months(end: NaiveDate, months: u32) -> Self {
        let from = end
            .checked_sub_months(chrono::Months::new(months.max(1) - 1))
            .and_then(|d| d.with_day0(0))
            .unwrap_or(end);
        Self { from, to: end }
    }

    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// Length in weeks, never less than one
    pub fn weeks(&self) -> f64 {
        (self.days() as f64 / 7.0).max(1.0)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}


// ----------------------------------------------------------------------------
// Utilization
// ----------------------------------------------------------------------------

/// Utilization for a calendar bucket, overall and broken down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSnapshot {
    pub period: String,
    /// Always within 0-100
    pub overall: f64,
    pub by_department: Vec<DepartmentUtilization>,
    pub by_skill: Vec<SkillUtilization>,
    pub basis: DataBasis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentUtilization {
    pub department: String,
    pub utilization: f64,
    /// Uncommitted hours in the window
    pub available: f64,
    /// Allocated hours in the window
    pub committed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillUtilization {
    pub skill: String,
    pub utilization: f64,
    /// Holders of the skill with uncommitted hours
    pub available_resources: u32,
}

/// One bucket of the capacity time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityTrendPoint {
    pub period: String,
    pub utilization: f64,
    /// Hours
    pub capacity: f64,
    /// Hours
    pub demand: f64,
}

/// Output of the trend estimator for one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// Change per period
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub periods: usize,
}

/// Capacity history with its fitted trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityTrends {
    pub points: Vec<CapacityTrendPoint>,
    pub utilization_trend: TrendAnalysis,
    pub demand_trend: TrendAnalysis,
    pub basis: DataBasis,
}

// ----------------------------------------------------------------------------
// Bottlenecks
// ----------------------------------------------------------------------------

/// A classified capacity shortfall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    #[serde(rename = "type")]
    pub bottleneck_type: BottleneckType,
    pub affected_resource: String,
    pub severity: Severity,
    /// 0-100
    pub impact: f64,
    pub affected_projects: Vec<i64>,
    /// Days
    pub estimated_duration: i64,
    pub root_causes: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub status: BottleneckStatus,
}

/// Current, predicted, and historical bottlenecks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BottleneckReport {
    pub current: Vec<Bottleneck>,
    pub predicted: Vec<Bottleneck>,
    pub historical: Vec<Bottleneck>,
    pub basis: DataBasis,
}

// ----------------------------------------------------------------------------
// Scenarios
// ----------------------------------------------------------------------------

/// One hypothetical change. `change_type` stays a string so unknown kinds
/// survive deserialization and can be reported back as warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioChange {
    #[serde(rename = "type")]
    pub change_type: String,
    #[serde(default)]
    pub details: ScenarioChangeDetails,
}

impl ScenarioChange {
    pub fn new(change_type: impl Into<String>, details: ScenarioChangeDetails) -> Self {
        Self {
            change_type: change_type.into(),
            details,
        }
    }
}

/// Type-specific payload; which fields matter depends on the change type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScenarioChangeDetails {
    pub name: Option<String>,
    /// add_project: people on the project
    pub team_size: Option<f64>,
    /// add_project: length in weeks
    pub duration_weeks: Option<f64>,
    /// add_resources / remove_resources: headcount
    pub count: Option<f64>,
    /// change_demand: percent of baseline committed demand
    pub percentage: Option<f64>,
    /// Attribute the change to a department
    pub department: Option<String>,
}

/// Options applied to the baseline a scenario runs against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisOptions {
    pub department: Option<String>,
    pub window_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScenarioRequest {
    pub changes: Vec<ScenarioChange>,
    #[serde(default)]
    pub analysis_options: AnalysisOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentImpact {
    pub department: String,
    pub demand_change: f64,
    pub capacity_change: f64,
    pub baseline_utilization: f64,
    pub projected_utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityImpact {
    pub baseline_utilization: f64,
    pub new_overall_utilization: f64,
    /// Hours
    pub total_capacity_change: f64,
    /// Hours
    pub total_demand_change: f64,
    pub department_impacts: Vec<DepartmentImpact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioBottleneckAnalysis {
    pub existing: Vec<Bottleneck>,
    pub new_bottlenecks: Vec<Bottleneck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub level: RiskLevel,
    pub description: String,
    pub mitigation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub risks: Vec<RiskFactor>,
}

/// Result of one scenario run. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_id: String,
    pub capacity_impact: CapacityImpact,
    pub bottleneck_analysis: ScenarioBottleneckAnalysis,
    pub recommendations: Vec<Recommendation>,
    pub risk_assessment: RiskAssessment,
    /// Changes that were ignored or incomplete
    pub warnings: Vec<String>,
    pub baseline_basis: DataBasis,
}

// ----------------------------------------------------------------------------
// Recommendations
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Hiring,
    Training,
    Rebalancing,
    BottleneckResolution,
    Monitoring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: RiskLevel,
    pub title: String,
    pub description: String,
}

impl Recommendation {
    pub fn new(
        category: RecommendationCategory,
        priority: RiskLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            priority,
            title: title.into(),
            description: description.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Skills
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDemandForecast {
    pub skill: String,
    pub current_supply: u32,
    pub forecasted_demand: u32,
    /// max(0, forecasted_demand - current_supply)
    pub gap: u32,
    /// 0-1
    pub confidence: f64,
    pub trend_direction: TrendDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessImpact {
    #[serde(rename = "critical delays")]
    CriticalDelays,
    #[serde(rename = "moderate impact")]
    ModerateImpact,
    #[serde(rename = "minor impact")]
    MinorImpact,
}

impl BusinessImpact {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessImpact::CriticalDelays => "critical delays",
            BusinessImpact::ModerateImpact => "moderate impact",
            BusinessImpact::MinorImpact => "minor impact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill: String,
    pub gap: u32,
    pub severity: Severity,
    /// Weeks
    pub time_to_fill: u32,
    pub business_impact: BusinessImpact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiringRecommendation {
    pub skill: String,
    pub positions: u32,
    pub urgency: Severity,
    pub time_to_fill: u32,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingCandidate {
    pub employee_id: i64,
    pub name: String,
    pub related_skill: String,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecommendation {
    pub skill: String,
    pub candidates: Vec<TrainingCandidate>,
    /// Sizing heuristic within 2-7, not an exact head count
    pub estimated_trainees: u32,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillForecastReport {
    pub horizon_months: u32,
    pub skill_demand: Vec<SkillDemandForecast>,
    pub skill_gaps: Vec<SkillGap>,
    pub hiring_recommendations: Vec<HiringRecommendation>,
    pub training_recommendations: Vec<TrainingRecommendation>,
}

// ----------------------------------------------------------------------------
// Optimization
// ----------------------------------------------------------------------------

/// One allocation row as the optimizer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub employee_id: i64,
    pub project_id: i64,
    pub allocated_hours: f64,
    pub default_hours: f64,
    #[serde(default)]
    pub employee_skills: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    CapacityAdjustment,
    Reassignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
    pub employee_id: i64,
    pub project_id: i64,
    /// Signed hours; only set for capacity adjustments
    pub adjustment: Option<f64>,
    pub reason: String,
    /// Percentage points
    pub expected_improvement: f64,
    /// 0-1
    pub confidence: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationPhase {
    pub phase: u32,
    pub name: String,
    pub risk_level: RiskLevel,
    pub duration: String,
    pub suggestions: Vec<OptimizationSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRiskAssessment {
    pub overall_risk: RiskLevel,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub suggestions: Vec<OptimizationSuggestion>,
    /// Mean expected improvement of the returned suggestions
    pub expected_improvement: f64,
    pub risk_assessment: OptimizationRiskAssessment,
    pub implementation: Vec<ImplementationPhase>,
}

// ----------------------------------------------------------------------------
// Predictions and patterns
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionScenario {
    Optimistic,
    Realistic,
    Pessimistic,
}

impl PredictionScenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionScenario::Optimistic => "optimistic",
            PredictionScenario::Realistic => "realistic",
            PredictionScenario::Pessimistic => "pessimistic",
        }
    }

    pub fn all() -> Vec<PredictionScenario> {
        vec![
            PredictionScenario::Optimistic,
            PredictionScenario::Realistic,
            PredictionScenario::Pessimistic,
        ]
    }
}

impl fmt::Display for PredictionScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PredictionScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "optimistic" => Ok(PredictionScenario::Optimistic),
            "realistic" => Ok(PredictionScenario::Realistic),
            "pessimistic" => Ok(PredictionScenario::Pessimistic),
            _ => Err(format!("Unknown prediction scenario: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedPoint {
    pub period: String,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub scenario: PredictionScenario,
    pub horizon_months: u32,
    /// Utilization at the end of the horizon
    pub predicted_utilization: f64,
    pub points: Vec<PredictedPoint>,
    /// Percent (0-100)
    pub confidence: f64,
    pub basis: DataBasis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOptions {
    pub horizon: u32,
    pub scenarios: Vec<PredictionScenario>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAverage {
    pub month: u32,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub present: bool,
    pub overall_average: f64,
    pub variance: f64,
    pub monthly_averages: Vec<MonthlyAverage>,
    pub peak_months: Vec<u32>,
    pub low_months: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub period: String,
    pub actual_utilization: f64,
    pub expected_utilization: f64,
    pub deviation: f64,
    pub possible_causes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternOptions {
    pub period_months: u32,
    pub granularity: Granularity,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            period_months: 12,
            granularity: Granularity::Monthly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationPatterns {
    pub patterns: Vec<CapacityTrendPoint>,
    pub seasonality: Seasonality,
    pub trends: TrendAnalysis,
    pub anomalies: Vec<Anomaly>,
}

// ----------------------------------------------------------------------------
// Intelligence report
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IntelligenceFilters {
    pub department: Option<String>,
    pub timeframe_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityIntelligence {
    pub current_utilization: UtilizationSnapshot,
    pub capacity_trends: CapacityTrends,
    pub bottleneck_analysis: BottleneckReport,
    pub predictions: Vec<Prediction>,
    pub recommendations: Vec<Recommendation>,
    pub risk_factors: Vec<RiskFactor>,
    /// Sections replaced by a fallback because their query failed
    pub degraded_sections: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_impact(95.0), Severity::Critical);
        assert_eq!(Severity::from_impact(90.0), Severity::Critical);
        assert_eq!(Severity::from_impact(89.9), Severity::High);
        assert_eq!(Severity::from_impact(70.0), Severity::High);
        assert_eq!(Severity::from_impact(69.9), Severity::Medium);
        assert_eq!(Severity::from_impact(40.0), Severity::Medium);
        assert_eq!(Severity::from_impact(39.9), Severity::Low);
        assert_eq!(Severity::from_impact(0.0), Severity::Low);
    }

    #[test]
    fn test_severity_monotonic_in_impact() {
        let mut previous = Severity::Low;
        for step in 0..=200 {
            let severity = Severity::from_impact(step as f64 * 0.5);
            assert!(severity >= previous);
            previous = severity;
        }
    }

    #[test]
    fn test_trailing_ranges() {
        let end = NaiveDate::from_ymd_opt(2026, 3, 18).unwrap();

        let week = DateRange::trailing_days(end, 7);
        assert_eq!(week.from, NaiveDate::from_ymd_opt(2026, 3, 12).unwrap());
        assert_eq!(week.days(), 7);

        let months = DateRange::trailing_months(end, 3);
        assert_eq!(months.from, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(months.to, end);
    }

    #[test]
    fn test_trailing_days_clamps_instead_of_overflowing() {
        let end = NaiveDate::from_ymd_opt(2026, 3, 18).unwrap();

        let range = DateRange::trailing_days(end, i64::MAX);
        assert_eq!(range.from, NaiveDate::MIN);
        assert_eq!(range.to, end);

        let single = DateRange::trailing_days(end, -5);
        assert_eq!(single.from, end);
    }

    #[test]
    fn test_unknown_change_type_deserializes() {
        let change: ScenarioChange =
            serde_json::from_str(r#"{"type": "merge_teams", "details": {}}"#).unwrap();
        assert_eq!(change.change_type, "merge_teams");
    }

    #[test]
    fn test_business_impact_serializes_as_text() {
        let json = serde_json::to_value(BusinessImpact::ModerateImpact).unwrap();
        assert_eq!(json, "moderate impact");
    }
}
