//! Allocation optimization advisor
//!
//! Each allocation row is checked for over-allocation, under-allocation and
//! skill mismatch. Suggestions are ranked by expected improvement and grouped
//! into a phased rollout by risk.

use std::collections::BTreeSet;

use tracing::debug;

use super::types::{
    AllocationRecord, ImplementationPhase, OptimizationResult, OptimizationRiskAssessment,
    OptimizationSuggestion, RiskLevel, SuggestionType,
};

const OVER_ALLOCATION: f64 = 1.0;
const UNDER_ALLOCATION: f64 = 0.7;
/// Utilization an under-allocated employee is raised to
const TARGET_UTILIZATION: f64 = 0.8;
const MIN_SKILL_MATCH: f64 = 0.7;
/// Excess hours above which reducing an allocation is high risk
const HIGH_RISK_EXCESS_HOURS: f64 = 20.0;

/// Allocated share of contracted hours; 0 when there are no contracted hours
pub fn allocation_utilization(record: &AllocationRecord) -> f64 {
    if record.default_hours > 0.0 {
        record.allocated_hours / record.default_hours
    } else {
        0.0
    }
}

/// Fraction of required skills the employee holds; 1 when nothing is required
pub fn skill_match(employee_skills: &[String], required_skills: &[String]) -> f64 {
    if required_skills.is_empty() {
        return 1.0;
    }
    let held: BTreeSet<String> = employee_skills.iter().map(|s| s.to_lowercase()).collect();
    let required: BTreeSet<String> = required_skills.iter().map(|s| s.to_lowercase()).collect();
    let matched = required.intersection(&held).count();
    matched as f64 / required.len() as f64
}

/// Suggestions for a single allocation row
pub fn evaluate_allocation(record: &AllocationRecord) -> Vec<OptimizationSuggestion> {
    let mut suggestions = Vec::new();

    if record.default_hours > 0.0 {
        let utilization = allocation_utilization(record);

        if utilization > OVER_ALLOCATION {
            let excess = record.allocated_hours - record.default_hours;
            suggestions.push(OptimizationSuggestion {
                suggestion_type: SuggestionType::CapacityAdjustment,
                employee_id: record.employee_id,
                project_id: record.project_id,
                adjustment: Some(-excess),
                reason: format!(
                    "Over-allocated at {:.0}% of contracted hours ({:.1}h excess)",
                    utilization * 100.0,
                    excess
                ),
                expected_improvement: (utilization - OVER_ALLOCATION) * 100.0,
                confidence: 0.8,
                risk_level: if excess > HIGH_RISK_EXCESS_HOURS {
                    RiskLevel::High
                } else {
                    RiskLevel::Medium
                },
            });
        } else if utilization < UNDER_ALLOCATION {
            let target = record.default_hours * TARGET_UTILIZATION;
            suggestions.push(OptimizationSuggestion {
                suggestion_type: SuggestionType::CapacityAdjustment,
                employee_id: record.employee_id,
                project_id: record.project_id,
                adjustment: Some(target - record.allocated_hours),
                reason: format!(
                    "Under-allocated at {:.0}% of contracted hours",
                    utilization * 100.0
                ),
                expected_improvement: (TARGET_UTILIZATION - utilization) * 100.0,
                confidence: 0.7,
                risk_level: RiskLevel::Low,
            });
        }
    }

    if !record.employee_skills.is_empty() && !record.required_skills.is_empty() {
        let matched = skill_match(&record.employee_skills, &record.required_skills);
        if matched < MIN_SKILL_MATCH {
            suggestions.push(OptimizationSuggestion {
                suggestion_type: SuggestionType::Reassignment,
                employee_id: record.employee_id,
                project_id: record.project_id,
                adjustment: None,
                reason: format!(
                    "Holds {:.0}% of the skills project {} requires",
                    matched * 100.0,
                    record.project_id
                ),
                expected_improvement: (TARGET_UTILIZATION - matched) * 100.0,
                confidence: 0.6,
                risk_level: RiskLevel::Medium,
            });
        }
    }

    suggestions
}

fn phase_duration(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Low => "1-2 weeks",
        RiskLevel::Medium => "2-3 weeks",
        RiskLevel::High | RiskLevel::Critical => "3-4 weeks",
    }
}

fn phase_name(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Low => "Quick wins",
        RiskLevel::Medium => "Rebalancing",
        RiskLevel::High | RiskLevel::Critical => "Structural changes",
    }
}

/// Group suggestions into low, medium and high risk phases, skipping empty ones
pub fn build_implementation_plan(suggestions: &[OptimizationSuggestion]) -> Vec<ImplementationPhase> {
    let mut phases = Vec::new();
    for risk in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
        let members: Vec<OptimizationSuggestion> = suggestions
            .iter()
            .filter(|s| s.risk_level == risk || (risk == RiskLevel::High && s.risk_level == RiskLevel::Critical))
            .cloned()
            .collect();
        if members.is_empty() {
            continue;
        }
        phases.push(ImplementationPhase {
            phase: phases.len() as u32 + 1,
            name: phase_name(risk).to_string(),
            risk_level: risk,
            duration: phase_duration(risk).to_string(),
            suggestions: members,
        });
    }
    phases
}

fn assess_risk(suggestions: &[OptimizationSuggestion]) -> OptimizationRiskAssessment {
    let count = |level: RiskLevel| suggestions.iter().filter(|s| s.risk_level >= level).count();
    let high = count(RiskLevel::High);
    let medium = count(RiskLevel::Medium) - high;
    let low = suggestions.len() - high - medium;

    let overall_risk = if high > 0 {
        RiskLevel::High
    } else if medium > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    OptimizationRiskAssessment {
        overall_risk,
        high_risk_count: high,
        medium_risk_count: medium,
        low_risk_count: low,
    }
}

/// Evaluate every allocation and return the top `max_suggestions` suggestions
pub fn optimize(records: &[AllocationRecord], max_suggestions: usize) -> OptimizationResult {
    let mut suggestions: Vec<OptimizationSuggestion> =
        records.iter().flat_map(evaluate_allocation).collect();

    suggestions.sort_by(|a, b| {
        b.expected_improvement
            .partial_cmp(&a.expected_improvement)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.employee_id.cmp(&b.employee_id))
            .then_with(|| a.project_id.cmp(&b.project_id))
    });
    suggestions.truncate(max_suggestions);

    let expected_improvement = if suggestions.is_empty() {
        0.0
    } else {
        suggestions.iter().map(|s| s.expected_improvement).sum::<f64>() / suggestions.len() as f64
    };

    debug!(
        allocations = records.len(),
        suggestions = suggestions.len(),
        "Optimized allocations"
    );

    OptimizationResult {
        risk_assessment: assess_risk(&suggestions),
        implementation: build_implementation_plan(&suggestions),
        expected_improvement,
        suggestions,
    }
}
