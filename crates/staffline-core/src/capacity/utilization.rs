//! Utilization calculator
//!
//! Turns the workforce rows for a window into overall, per-department and
//! per-skill utilization. All three breakdowns are genuine aggregates of the
//! same rows.

use std::collections::BTreeMap;

use chrono::Datelike;
use tracing::debug;

use crate::config::EngineConfig;

use super::gateway::WorkforceMember;
use super::types::{
    DataBasis, DateRange, DepartmentUtilization, SkillUtilization, UtilizationSnapshot,
};

/// 100 x allocated / capacity, clamped to 0-100; zero capacity reads as 0
pub fn utilization_percent(allocated: f64, capacity: f64) -> f64 {
    if capacity > 0.0 {
        (allocated / capacity * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Calendar label for a window: ISO week for a week or less, else the dates
pub fn period_label(range: &DateRange) -> String {
    if range.days() <= 7 {
        let week = range.to.iso_week();
        format!("{}-W{:02}", week.year(), week.week())
    } else {
        format!("{}..{}", range.from, range.to)
    }
}

#[derive(Default)]
struct Totals {
    capacity: f64,
    committed: f64,
    available_people: u32,
}

/// Compute the utilization snapshot for `range`
///
/// With no workforce rows the configured fallback baseline is returned with
/// empty breakdowns and `basis = fallback`.
pub fn compute_utilization(
    workforce: &[WorkforceMember],
    range: DateRange,
    config: &EngineConfig,
) -> UtilizationSnapshot {
    let period = period_label(&range);

    if workforce.is_empty() {
        debug!(period = %period, "No workforce rows, using fallback utilization");
        return UtilizationSnapshot {
            period,
            overall: config.fallback_utilization.clamp(0.0, 100.0),
            by_department: vec![],
            by_skill: vec![],
            basis: DataBasis::Fallback,
        };
    }

    let weeks = range.weeks();
    let mut overall = Totals::default();
    let mut departments: BTreeMap<&str, Totals> = BTreeMap::new();
    let mut skills: BTreeMap<&str, Totals> = BTreeMap::new();

    for member in workforce {
        let capacity = member.capacity_for(weeks);
        let committed = member.allocated_hours.max(0.0);
        let has_slack = committed < capacity;

        overall.capacity += capacity;
        overall.committed += committed;

        let dept = departments.entry(member.department.as_str()).or_default();
        dept.capacity += capacity;
        dept.committed += committed;

        for skill in &member.skills {
            let entry = skills.entry(skill.skill.as_str()).or_default();
            entry.capacity += capacity;
            entry.committed += committed;
            if has_slack {
                entry.available_people += 1;
            }
        }
    }

    let by_department = departments
        .into_iter()
        .map(|(department, totals)| DepartmentUtilization {
            department: department.to_string(),
            utilization: utilization_percent(totals.committed, totals.capacity),
            available: (totals.capacity - totals.committed).max(0.0),
            committed: totals.committed,
        })
        .collect::<Vec<_>>();

    let by_skill = skills
        .into_iter()
        .map(|(skill, totals)| SkillUtilization {
            skill: skill.to_string(),
            utilization: utilization_percent(totals.committed, totals.capacity),
            available_resources: totals.available_people,
        })
        .collect::<Vec<_>>();

    debug!(
        period = %period,
        employees = workforce.len(),
        departments = by_department.len(),
        skills = by_skill.len(),
        "Computed utilization"
    );

    UtilizationSnapshot {
        period,
        overall: utilization_percent(overall.committed, overall.capacity),
        by_department,
        by_skill,
        basis: DataBasis::Measured,
    }
}
