//! Skill gap analysis and demand forecasting

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ProficiencyLevel, SkillCategory};

use super::gateway::{SkillDemandRow, SkillHistoryRow, SkillSupplyRow, WorkforceMember};
use super::trend::{bucket_offsets, classify_trend, linear_regression};
use super::types::{
    BusinessImpact, Granularity, HiringRecommendation, Severity, SkillDemandForecast,
    SkillForecastReport, SkillGap, TrainingCandidate, TrainingRecommendation, TrendDirection,
};

/// Monthly periods required before a forecast is attempted
pub const MIN_HISTORY_PERIODS: usize = 3;
/// Training recommendations are sized within this range
pub const MIN_TRAINEES: u32 = 2;
pub const MAX_TRAINEES: u32 = 7;
/// Candidates must be below this share of their contracted hours
const CANDIDATE_MAX_UTILIZATION: f64 = 0.9;
/// Per-month growth assumed by the category heuristic
const HEURISTIC_MONTHLY_GROWTH: f64 = 0.05;

/// Everything the forecast reads
#[derive(Debug, Clone, Copy)]
pub struct SkillInputs<'a> {
    pub supply: &'a [SkillSupplyRow],
    pub demand: &'a [SkillDemandRow],
    pub history: &'a [SkillHistoryRow],
    pub workforce: &'a [WorkforceMember],
    /// Length of the window the workforce hours cover
    pub workforce_weeks: f64,
}

pub fn gap_severity(gap: u32) -> Severity {
    if gap > 5 {
        Severity::Critical
    } else if gap > 3 {
        Severity::High
    } else if gap > 1 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Weeks to fill a gap, never under four
pub fn time_to_fill(gap: u32) -> u32 {
    gap.saturating_mul(6).max(4)
}

pub fn business_impact(gap: u32) -> BusinessImpact {
    if gap > 5 {
        BusinessImpact::CriticalDelays
    } else if gap > 3 {
        BusinessImpact::ModerateImpact
    } else {
        BusinessImpact::MinorImpact
    }
}

/// Trend assumed for a skill without enough history
pub fn category_trend(category: SkillCategory) -> TrendDirection {
    match category {
        SkillCategory::Technical | SkillCategory::Domain => TrendDirection::Increasing,
        SkillCategory::Soft | SkillCategory::Other => TrendDirection::Stable,
    }
}

struct SkillTrend {
    direction: TrendDirection,
    /// Expected demand multiplier at the horizon
    growth: f64,
    confidence: f64,
}

fn skill_trend(series: Option<&[f64]>, category: SkillCategory, horizon: u32) -> SkillTrend {
    let horizon_f = horizon as f64;
    let horizon_penalty = 0.02 * horizon_f;

    if let Some(values) = series {
        let fit = linear_regression(values);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let relative_slope = if mean > 0.0 { fit.slope / mean } else { 0.0 };
        return SkillTrend {
            direction: classify_trend(fit.slope),
            growth: (1.0 + relative_slope * horizon_f).clamp(0.5, 2.0),
            confidence: (0.5 + 0.4 * fit.r_squared - horizon_penalty).clamp(0.1, 0.95),
        };
    }

    let direction = category_trend(category);
    let growth = match direction {
        TrendDirection::Increasing => 1.0 + HEURISTIC_MONTHLY_GROWTH * horizon_f,
        TrendDirection::Decreasing => 1.0 - HEURISTIC_MONTHLY_GROWTH * horizon_f,
        TrendDirection::Stable => 1.0,
    };
    SkillTrend {
        direction,
        growth: growth.clamp(0.5, 2.0),
        confidence: (0.5 - horizon_penalty).clamp(0.1, 0.95),
    }
}

/// Employees who could be trained into `skill`, least utilized first
pub fn find_training_candidates(
    skill: &str,
    category: SkillCategory,
    workforce: &[WorkforceMember],
    weeks: f64,
) -> Vec<TrainingCandidate> {
    let mut candidates: Vec<TrainingCandidate> = workforce
        .iter()
        .filter(|m| {
            !matches!(
                m.level_in(skill),
                Some(ProficiencyLevel::Advanced | ProficiencyLevel::Expert)
            )
        })
        .filter(|m| m.utilization_ratio(weeks) < CANDIDATE_MAX_UTILIZATION)
        .filter_map(|m| {
            let related = m
                .skills
                .iter()
                .filter(|s| !s.skill.eq_ignore_ascii_case(skill))
                .filter(|s| s.category == category && s.level >= ProficiencyLevel::Intermediate)
                .max_by(|a, b| a.level.cmp(&b.level).then_with(|| b.skill.cmp(&a.skill)))?;
            Some(TrainingCandidate {
                employee_id: m.employee_id,
                name: m.name.clone(),
                related_skill: related.skill.clone(),
                utilization: m.utilization_ratio(weeks) * 100.0,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.utilization
            .partial_cmp(&b.utilization)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });
    candidates.truncate(MAX_TRAINEES as usize);
    candidates
}

/// Position of each "YYYY-MM" period, in months from the earliest one
fn month_offsets<'a>(months: &BTreeSet<&'a str>) -> Result<BTreeMap<&'a str, usize>> {
    let starts = months
        .iter()
        .map(|m| {
            NaiveDate::parse_from_str(&format!("{}-01", m), "%Y-%m-%d")
                .map_err(|e| Error::InvalidData(format!("Bad skill history period '{}': {}", m, e)))
        })
        .collect::<Result<Vec<_>>>()?;
    let offsets = bucket_offsets(&starts, Granularity::Monthly);
    Ok(months
        .iter()
        .zip(offsets)
        .map(|(m, offset)| (*m, offset.max(0.0) as usize))
        .collect())
}

/// Forecast demand per skill over `horizon` months and derive gaps, hiring and
/// training actions
pub fn forecast_skills(inputs: SkillInputs<'_>, horizon: u32) -> Result<SkillForecastReport> {
    let months: BTreeSet<&str> = inputs.history.iter().map(|h| h.period.as_str()).collect();
    if months.len() < MIN_HISTORY_PERIODS {
        return Err(Error::InsufficientData {
            required: MIN_HISTORY_PERIODS,
            available: months.len(),
        });
    }
    let month_index = month_offsets(&months)?;
    let span = month_index.values().max().map_or(0, |last| last + 1);

    // Zero-filled monthly series per skill, plus how many months had data.
    // Months nobody worked in stay on the axis as zeros.
    let mut series: BTreeMap<&str, (Vec<f64>, usize)> = BTreeMap::new();
    for row in inputs.history {
        let entry = series
            .entry(row.skill.as_str())
            .or_insert_with(|| (vec![0.0; span], 0));
        if let Some(&i) = month_index.get(row.period.as_str()) {
            if entry.0[i] == 0.0 && row.allocation_count > 0 {
                entry.1 += 1;
            }
            entry.0[i] += row.allocation_count as f64;
        }
    }

    let mut skills: BTreeMap<&str, (SkillCategory, u32, u32)> = BTreeMap::new();
    for row in inputs.supply {
        let entry = skills.entry(row.skill.as_str()).or_insert((row.category, 0, 0));
        entry.0 = row.category;
        entry.1 = row.current_supply;
    }
    for row in inputs.demand {
        let entry = skills
            .entry(row.skill.as_str())
            .or_insert((SkillCategory::Other, 0, 0));
        entry.2 = row.total_demand;
    }

    let mut skill_demand = Vec::with_capacity(skills.len());
    let mut categories = BTreeMap::new();
    for (skill, (category, supply, demand)) in skills {
        let history = series
            .get(skill)
            .filter(|(_, months_with_data)| *months_with_data >= MIN_HISTORY_PERIODS)
            .map(|(values, _)| values.as_slice());
        let trend = skill_trend(history, category, horizon);
        let forecasted_demand = (demand as f64 * trend.growth).round().max(0.0) as u32;

        categories.insert(skill.to_string(), category);
        skill_demand.push(SkillDemandForecast {
            skill: skill.to_string(),
            current_supply: supply,
            forecasted_demand,
            gap: forecasted_demand.saturating_sub(supply),
            confidence: trend.confidence,
            trend_direction: trend.direction,
        });
    }

    let mut skill_gaps: Vec<SkillGap> = skill_demand
        .iter()
        .filter(|f| f.gap > 0)
        .map(|f| SkillGap {
            skill: f.skill.clone(),
            gap: f.gap,
            severity: gap_severity(f.gap),
            time_to_fill: time_to_fill(f.gap),
            business_impact: business_impact(f.gap),
        })
        .collect();
    skill_gaps.sort_by(|a, b| b.gap.cmp(&a.gap).then_with(|| a.skill.cmp(&b.skill)));

    let hiring_recommendations = skill_gaps
        .iter()
        .filter(|g| g.severity >= Severity::High)
        .map(|g| HiringRecommendation {
            skill: g.skill.clone(),
            positions: g.gap,
            urgency: g.severity,
            time_to_fill: g.time_to_fill,
            rationale: format!(
                "Forecast demand exceeds supply by {} within {} months ({})",
                g.gap,
                horizon,
                g.business_impact.as_str()
            ),
        })
        .collect();

    let training_recommendations = skill_gaps
        .iter()
        .filter_map(|g| {
            let category = categories.get(&g.skill).copied().unwrap_or_default();
            let candidates = find_training_candidates(
                &g.skill,
                category,
                inputs.workforce,
                inputs.workforce_weeks,
            );
            if candidates.is_empty() {
                return None;
            }
            let estimated_trainees = (candidates.len() as u32).clamp(MIN_TRAINEES, MAX_TRAINEES);
            Some(TrainingRecommendation {
                skill: g.skill.clone(),
                rationale: format!(
                    "{} employees hold related {} skills and have spare capacity",
                    candidates.len(),
                    category
                ),
                candidates,
                estimated_trainees,
            })
        })
        .collect();

    debug!(
        skills = skill_demand.len(),
        gaps = skill_gaps.len(),
        months = months.len(),
        "Forecast skill demand"
    );

    Ok(SkillForecastReport {
        horizon_months: horizon,
        skill_demand,
        skill_gaps,
        hiring_recommendations,
        training_recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmployeeSkill;

    fn supply(skill: &str, category: SkillCategory, count: u32) -> SkillSupplyRow {
        SkillSupplyRow {
            skill: skill.to_string(),
            category,
            current_supply: count,
            avg_proficiency: 2.5,
        }
    }

    fn demand(skill: &str, total: u32) -> SkillDemandRow {
        SkillDemandRow {
            skill: skill.to_string(),
            projects_requiring: 1,
            total_demand: total,
        }
    }

    fn history(skill: &str, counts: &[u32]) -> Vec<SkillHistoryRow> {
        counts
            .iter()
            .enumerate()
            .map(|(i, c)| SkillHistoryRow {
                skill: skill.to_string(),
                period: format!("2026-{:02}", i + 1),
                allocation_count: *c,
            })
            .collect()
    }

    fn employee(id: i64, allocated: f64, skills: &[(&str, ProficiencyLevel)]) -> WorkforceMember {
        WorkforceMember {
            employee_id: id,
            name: format!("Employee {}", id),
            department: "Engineering".to_string(),
            default_hours: 40.0,
            allocated_hours: allocated,
            skills: skills
                .iter()
                .map(|(s, level)| EmployeeSkill {
                    skill: s.to_string(),
                    category: SkillCategory::Technical,
                    level: *level,
                })
                .collect(),
        }
    }

    #[test]
    fn test_gap_classification() {
        assert_eq!(gap_severity(0), Severity::Low);
        assert_eq!(gap_severity(1), Severity::Low);
        assert_eq!(gap_severity(2), Severity::Medium);
        assert_eq!(gap_severity(4), Severity::High);
        assert_eq!(gap_severity(6), Severity::Critical);

        assert_eq!(time_to_fill(0), 4);
        assert_eq!(time_to_fill(1), 6);
        assert_eq!(time_to_fill(5), 30);
        assert_eq!(time_to_fill(800_000_000), u32::MAX);

        assert_eq!(business_impact(6), BusinessImpact::CriticalDelays);
        assert_eq!(business_impact(4), BusinessImpact::ModerateImpact);
        assert_eq!(business_impact(2), BusinessImpact::MinorImpact);
    }

    #[test]
    fn test_insufficient_history_is_an_error() {
        let rows = history("Rust", &[3, 4]);
        let inputs = SkillInputs {
            supply: &[],
            demand: &[],
            history: &rows,
            workforce: &[],
            workforce_weeks: 1.0,
        };
        match forecast_skills(inputs, 3) {
            Err(Error::InsufficientData { required, available }) => {
                assert_eq!(required, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_gap_never_negative() {
        let supply_rows = vec![supply("Rust", SkillCategory::Technical, 10)];
        let demand_rows = vec![demand("Rust", 2)];
        let rows = history("Rust", &[5, 5, 5]);
        let inputs = SkillInputs {
            supply: &supply_rows,
            demand: &demand_rows,
            history: &rows,
            workforce: &[],
            workforce_weeks: 1.0,
        };

        let report = forecast_skills(inputs, 3).unwrap();
        assert_eq!(report.skill_demand.len(), 1);
        assert_eq!(report.skill_demand[0].gap, 0);
        assert_eq!(report.skill_demand[0].trend_direction, TrendDirection::Stable);
        assert!(report.skill_gaps.is_empty());
    }

    #[test]
    fn test_history_trend_and_hiring() {
        let supply_rows = vec![
            supply("Rust", SkillCategory::Technical, 1),
            supply("Communication", SkillCategory::Soft, 4),
        ];
        let demand_rows = vec![demand("Rust", 6), demand("Communication", 4)];
        let rows = history("Rust", &[2, 4, 6, 8]);
        let inputs = SkillInputs {
            supply: &supply_rows,
            demand: &demand_rows,
            history: &rows,
            workforce: &[],
            workforce_weeks: 1.0,
        };

        let report = forecast_skills(inputs, 3).unwrap();
        let rust = report.skill_demand.iter().find(|f| f.skill == "Rust").unwrap();
        assert_eq!(rust.trend_direction, TrendDirection::Increasing);
        assert!(rust.forecasted_demand > 6);
        assert_eq!(rust.gap, rust.forecasted_demand - 1);
        assert!(rust.confidence > 0.0 && rust.confidence <= 1.0);

        // No history for Communication: soft skills are assumed stable
        let comm = report.skill_demand.iter().find(|f| f.skill == "Communication").unwrap();
        assert_eq!(comm.trend_direction, TrendDirection::Stable);
        assert_eq!(comm.forecasted_demand, 4);

        assert_eq!(report.skill_gaps[0].skill, "Rust");
        assert_eq!(report.skill_gaps[0].severity, Severity::Critical);
        assert_eq!(report.hiring_recommendations.len(), 1);
        assert_eq!(report.hiring_recommendations[0].positions, rust.gap);
    }

    #[test]
    fn test_training_candidates() {
        let workforce = vec![
            // Related skill at intermediate, spare capacity
            employee(1, 10.0, &[("Go", ProficiencyLevel::Intermediate)]),
            // Already advanced in the target
            employee(2, 10.0, &[("Go", ProficiencyLevel::Expert), ("Rust", ProficiencyLevel::Advanced)]),
            // Too busy
            employee(3, 38.0, &[("Go", ProficiencyLevel::Expert)]),
            // Related skill only at beginner
            employee(4, 0.0, &[("Go", ProficiencyLevel::Beginner)]),
            employee(5, 0.0, &[("C++", ProficiencyLevel::Advanced), ("Rust", ProficiencyLevel::Beginner)]),
        ];

        let candidates = find_training_candidates("Rust", SkillCategory::Technical, &workforce, 1.0);
        let ids: Vec<_> = candidates.iter().map(|c| c.employee_id).collect();
        assert_eq!(ids, vec![5, 1]);
        assert_eq!(candidates[0].related_skill, "C++");
        assert_eq!(candidates[1].utilization, 25.0);
    }

    #[test]
    fn test_training_recommendation_is_bounded() {
        let workforce: Vec<_> = (1..=10)
            .map(|i| employee(i, 0.0, &[("Go", ProficiencyLevel::Advanced)]))
            .collect();
        let single = vec![employee(1, 0.0, &[("Go", ProficiencyLevel::Advanced)])];
        let supply_rows = vec![supply("Rust", SkillCategory::Technical, 0)];
        let demand_rows = vec![demand("Rust", 3)];
        let rows: Vec<_> = ["2026-01", "2026-02", "2026-03"]
            .iter()
            .map(|p| SkillHistoryRow {
                skill: "Go".to_string(),
                period: p.to_string(),
                allocation_count: 1,
            })
            .collect();

        let many = forecast_skills(
            SkillInputs {
                supply: &supply_rows,
                demand: &demand_rows,
                history: &rows,
                workforce: &workforce,
                workforce_weeks: 1.0,
            },
            3,
        )
        .unwrap();
        let training = &many.training_recommendations[0];
        assert_eq!(training.candidates.len(), 7);
        assert_eq!(training.estimated_trainees, 7);

        let few = forecast_skills(
            SkillInputs {
                supply: &supply_rows,
                demand: &demand_rows,
                history: &rows,
                workforce: &single,
                workforce_weeks: 1.0,
            },
            3,
        )
        .unwrap();
        assert_eq!(few.training_recommendations[0].estimated_trainees, 2);
    }

    #[test]
    fn test_month_offsets_keep_gaps() {
        let months: BTreeSet<&str> = ["2025-12", "2026-01", "2026-05"].into_iter().collect();
        let offsets = month_offsets(&months).unwrap();
        assert_eq!(offsets["2025-12"], 0);
        assert_eq!(offsets["2026-01"], 1);
        assert_eq!(offsets["2026-05"], 5);

        let bad: BTreeSet<&str> = ["2026-13"].into_iter().collect();
        assert!(matches!(month_offsets(&bad), Err(Error::InvalidData(_))));
    }
}
