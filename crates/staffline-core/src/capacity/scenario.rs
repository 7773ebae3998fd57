//! What-if scenario simulation
//!
//! A scenario starts from a baseline (current utilization and bottlenecks) and
//! applies an ordered list of changes to two running deltas, demand hours and
//! capacity hours. The simulation is a pure function of its inputs; the caller
//! supplies the scenario id.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::EngineConfig;

use super::types::{
    Bottleneck, BottleneckStatus, BottleneckType, CapacityImpact, DataBasis, DepartmentImpact,
    Recommendation, RecommendationCategory, RiskAssessment, RiskFactor, RiskLevel,
    ScenarioBottleneckAnalysis, ScenarioChange, ScenarioResult, Severity, UtilizationSnapshot,
};

/// Demand above this multiple of added capacity produces a predicted bottleneck
pub const DEMAND_PRESSURE_RATIO: f64 = 1.2;
/// Impact assigned to a synthesized scenario bottleneck
pub const SCENARIO_BOTTLENECK_IMPACT: f64 = 75.0;
/// Periods of capacity added or removed per resource change
const RESOURCE_PERIODS: f64 = 4.0;
/// Projected utilization above which hiring is recommended
const HIRING_THRESHOLD: f64 = 90.0;
const CRITICAL_RISK_THRESHOLD: f64 = 95.0;
const HIGH_RISK_THRESHOLD: f64 = 85.0;

/// Recognized change kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    AddProject,
    AddResources,
    RemoveResources,
    ChangeDemand,
}

impl ChangeKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add_project" => Some(Self::AddProject),
            "add_resources" => Some(Self::AddResources),
            "remove_resources" => Some(Self::RemoveResources),
            "change_demand" => Some(Self::ChangeDemand),
            _ => None,
        }
    }
}

/// State a scenario is simulated against
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioBaseline {
    pub utilization: UtilizationSnapshot,
    pub bottlenecks: Vec<Bottleneck>,
}

impl ScenarioBaseline {
    /// Committed hours across the baseline, estimated from the overall
    /// utilization and the assumed pool when no breakdown exists
    fn committed_hours(&self, config: &EngineConfig) -> f64 {
        if self.utilization.by_department.is_empty() {
            self.utilization.overall / 100.0 * config.assumed_capacity_pool
        } else {
            self.utilization.by_department.iter().map(|d| d.committed).sum()
        }
    }

    fn department(&self, name: &str) -> Option<&super::types::DepartmentUtilization> {
        self.utilization
            .by_department
            .iter()
            .find(|d| d.department.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Deltas {
    demand: f64,
    capacity: f64,
}

/// Hours one change adds to demand and capacity, or a warning if unusable
fn change_deltas(
    index: usize,
    change: &ScenarioChange,
    baseline: &ScenarioBaseline,
    config: &EngineConfig,
) -> Result<Deltas, String> {
    let kind = ChangeKind::parse(&change.change_type).ok_or_else(|| {
        format!(
            "change {}: unknown change type '{}' ignored",
            index + 1,
            change.change_type
        )
    })?;

    let details = &change.details;
    let missing = |field: &str| {
        format!(
            "change {} ({}): missing '{}', change ignored",
            index + 1,
            change.change_type,
            field
        )
    };
    let unit = config.hours_per_person_unit;

    let deltas = match kind {
        ChangeKind::AddProject => {
            let team_size = details.team_size.ok_or_else(|| missing("team_size"))?;
            let weeks = details.duration_weeks.ok_or_else(|| missing("duration_weeks"))?;
            Deltas {
                demand: team_size * weeks * unit,
                capacity: 0.0,
            }
        }
        ChangeKind::AddResources => {
            let count = details.count.ok_or_else(|| missing("count"))?;
            Deltas {
                demand: 0.0,
                capacity: count * unit * RESOURCE_PERIODS,
            }
        }
        ChangeKind::RemoveResources => {
            let count = details.count.ok_or_else(|| missing("count"))?;
            Deltas {
                demand: 0.0,
                capacity: -(count * unit * RESOURCE_PERIODS),
            }
        }
        ChangeKind::ChangeDemand => {
            let percentage = details.percentage.ok_or_else(|| missing("percentage"))?;
            let committed = details
                .department
                .as_deref()
                .and_then(|d| baseline.department(d))
                .map(|d| d.committed)
                .unwrap_or_else(|| baseline.committed_hours(config));
            Deltas {
                demand: committed * percentage / 100.0,
                capacity: 0.0,
            }
        }
    };

    Ok(deltas)
}

/// Utilization after adding `demand` hours against `capacity` extra hours on
/// top of a pool of `pool` hours
pub fn project_utilization(baseline: f64, demand: f64, capacity: f64, pool: f64) -> f64 {
    (baseline + demand / (capacity + pool).max(1.0) * 100.0).clamp(0.0, 100.0)
}

/// One predicted resource bottleneck iff demand outgrows capacity by more than 20%
pub fn predict_bottlenecks(demand_change: f64, capacity_change: f64) -> Vec<Bottleneck> {
    if demand_change <= capacity_change * DEMAND_PRESSURE_RATIO {
        return vec![];
    }

    vec![Bottleneck {
        bottleneck_type: BottleneckType::Resource,
        affected_resource: "Overall capacity".to_string(),
        severity: Severity::from_impact(SCENARIO_BOTTLENECK_IMPACT),
        impact: SCENARIO_BOTTLENECK_IMPACT,
        affected_projects: vec![],
        estimated_duration: 30,
        root_causes: vec![format!(
            "Added demand of {:.0}h exceeds added capacity of {:.0}h",
            demand_change, capacity_change
        )],
        recommended_actions: vec![
            "Add capacity before committing to the new demand".to_string(),
            "Stagger project start dates".to_string(),
        ],
        status: BottleneckStatus::Predicted,
    }]
}

/// Risk tier for a projected utilization
pub fn risk_level_for(utilization: f64) -> RiskLevel {
    if utilization > CRITICAL_RISK_THRESHOLD {
        RiskLevel::Critical
    } else if utilization > HIGH_RISK_THRESHOLD {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    }
}

fn assess_risk(utilization: f64) -> RiskAssessment {
    let level = risk_level_for(utilization);
    RiskAssessment {
        risk_level: level,
        risks: vec![RiskFactor {
            name: "overutilization".to_string(),
            level,
            description: format!("Projected utilization of {:.1}%", utilization),
            mitigation: "Monitor workload and rebalance allocations before they exceed capacity"
                .to_string(),
        }],
    }
}

/// Apply `changes` in order to `baseline`
pub fn simulate(
    scenario_id: String,
    baseline: &ScenarioBaseline,
    changes: &[ScenarioChange],
    config: &EngineConfig,
) -> ScenarioResult {
    let mut total = Deltas::default();
    let mut per_department: BTreeMap<String, Deltas> = BTreeMap::new();
    let mut warnings = Vec::new();

    for (index, change) in changes.iter().enumerate() {
        match change_deltas(index, change, baseline, config) {
            Ok(deltas) => {
                total.demand += deltas.demand;
                total.capacity += deltas.capacity;
                if let Some(dept) = &change.details.department {
                    let entry = per_department.entry(dept.clone()).or_default();
                    entry.demand += deltas.demand;
                    entry.capacity += deltas.capacity;
                }
            }
            Err(warning) => warnings.push(warning),
        }
    }

    let baseline_overall = baseline.utilization.overall;
    let new_overall = project_utilization(
        baseline_overall,
        total.demand,
        total.capacity,
        config.assumed_capacity_pool,
    );

    let department_impacts = per_department
        .into_iter()
        .map(|(department, deltas)| {
            let (dept_baseline, pool) = match baseline.department(&department) {
                Some(d) => (d.utilization, d.committed + d.available),
                None => (baseline_overall, config.assumed_capacity_pool),
            };
            DepartmentImpact {
                projected_utilization: project_utilization(
                    dept_baseline,
                    deltas.demand,
                    deltas.capacity,
                    pool,
                ),
                department,
                demand_change: deltas.demand,
                capacity_change: deltas.capacity,
                baseline_utilization: dept_baseline,
            }
        })
        .collect();

    let mut recommendations = Vec::new();
    if new_overall > HIRING_THRESHOLD {
        recommendations.push(Recommendation::new(
            RecommendationCategory::Hiring,
            risk_level_for(new_overall),
            "Hire additional staff",
            format!(
                "Projected utilization reaches {:.1}%; add headcount before taking on this change",
                new_overall
            ),
        ));
    }

    debug!(
        changes = changes.len(),
        ignored = warnings.len(),
        demand = total.demand,
        capacity = total.capacity,
        utilization = new_overall,
        "Simulated scenario"
    );

    ScenarioResult {
        scenario_id,
        capacity_impact: CapacityImpact {
            baseline_utilization: baseline_overall,
            new_overall_utilization: new_overall,
            total_capacity_change: total.capacity,
            total_demand_change: total.demand,
            department_impacts,
        },
        bottleneck_analysis: ScenarioBottleneckAnalysis {
            existing: baseline.bottlenecks.clone(),
            new_bottlenecks: predict_bottlenecks(total.demand, total.capacity),
        },
        recommendations,
        risk_assessment: assess_risk(new_overall),
        warnings,
        baseline_basis: if baseline.utilization.basis.is_fallback() {
            DataBasis::Fallback
        } else {
            DataBasis::Measured
        },
    }
}
