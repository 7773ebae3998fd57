//! Recommendation and risk aggregation for the intelligence report

use super::types::{
    BottleneckReport, CapacityTrends, Recommendation, RecommendationCategory, RiskFactor,
    RiskLevel, Severity, TrendDirection, UtilizationSnapshot,
};

const OVERLOADED: f64 = 90.0;
const STRETCHED: f64 = 85.0;
const CRITICAL_LOAD: f64 = 95.0;
const UNDERUSED: f64 = 60.0;
const IDLE: f64 = 50.0;
/// Monthly utilization growth (points) treated as a steep rise
const STEEP_SLOPE: f64 = 2.0;

/// Rule-based actions from utilization, bottlenecks and trend, most urgent first
pub fn build_recommendations(
    utilization: &UtilizationSnapshot,
    bottlenecks: &BottleneckReport,
    trends: &CapacityTrends,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    let overall = utilization.overall;

    if overall > OVERLOADED {
        recs.push(Recommendation::new(
            RecommendationCategory::Hiring,
            RiskLevel::High,
            "Add capacity",
            format!(
                "Overall utilization is {:.1}%; hire or contract to bring it under {:.0}%",
                overall, STRETCHED
            ),
        ));
    } else if overall > STRETCHED {
        recs.push(Recommendation::new(
            RecommendationCategory::Rebalancing,
            RiskLevel::Medium,
            "Rebalance workload",
            format!("Overall utilization is {:.1}%; shift work toward teams with slack", overall),
        ));
    } else if overall < UNDERUSED && !utilization.basis.is_fallback() {
        recs.push(Recommendation::new(
            RecommendationCategory::Rebalancing,
            RiskLevel::Low,
            "Use idle capacity",
            format!(
                "Overall utilization is {:.1}%; pull forward planned projects or cross-train",
                overall
            ),
        ));
    }

    for dept in utilization.by_department.iter().filter(|d| d.utilization > CRITICAL_LOAD) {
        recs.push(Recommendation::new(
            RecommendationCategory::Rebalancing,
            RiskLevel::High,
            format!("Relieve {}", dept.department),
            format!(
                "{} is at {:.1}% with {:.1}h uncommitted",
                dept.department, dept.utilization, dept.available
            ),
        ));
    }

    for bottleneck in bottlenecks
        .current
        .iter()
        .filter(|b| b.severity >= Severity::High)
    {
        let priority = if bottleneck.severity == Severity::Critical {
            RiskLevel::Critical
        } else {
            RiskLevel::High
        };
        let action = bottleneck
            .recommended_actions
            .first()
            .cloned()
            .unwrap_or_else(|| "Assign an owner and a resolution date".to_string());
        recs.push(Recommendation::new(
            RecommendationCategory::BottleneckResolution,
            priority,
            format!("Resolve {} bottleneck: {}", bottleneck.bottleneck_type, bottleneck.affected_resource),
            action,
        ));
    }

    if trends.utilization_trend.direction == TrendDirection::Increasing {
        recs.push(Recommendation::new(
            RecommendationCategory::Monitoring,
            if trends.utilization_trend.slope > STEEP_SLOPE {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            },
            "Watch rising utilization",
            format!(
                "Utilization is rising {:.1} points per period",
                trends.utilization_trend.slope
            ),
        ));
    }

    if utilization.basis.is_fallback() || trends.basis.is_fallback() || bottlenecks.basis.is_fallback() {
        recs.push(Recommendation::new(
            RecommendationCategory::Monitoring,
            RiskLevel::Low,
            "Improve data coverage",
            "Parts of this report use fallback values; record allocations and capacity snapshots",
        ));
    }

    recs.sort_by(|a, b| b.priority.cmp(&a.priority));
    recs
}

/// Risk factors present in the current state
pub fn assess_risk_factors(
    utilization: &UtilizationSnapshot,
    bottlenecks: &BottleneckReport,
    trends: &CapacityTrends,
) -> Vec<RiskFactor> {
    let mut risks = Vec::new();
    let overall = utilization.overall;

    if overall > STRETCHED {
        risks.push(RiskFactor {
            name: "overutilization".to_string(),
            level: if overall > CRITICAL_LOAD {
                RiskLevel::Critical
            } else {
                RiskLevel::High
            },
            description: format!("Overall utilization at {:.1}%", overall),
            mitigation: "Add capacity or defer lower-priority work".to_string(),
        });
    } else if overall < IDLE && !utilization.basis.is_fallback() {
        risks.push(RiskFactor {
            name: "underutilization".to_string(),
            level: RiskLevel::Medium,
            description: format!("Overall utilization at {:.1}%", overall),
            mitigation: "Bring forward pipeline projects or reassign staff".to_string(),
        });
    }

    let critical = bottlenecks
        .current
        .iter()
        .filter(|b| b.severity == Severity::Critical)
        .count();
    if critical > 0 {
        risks.push(RiskFactor {
            name: "critical_bottlenecks".to_string(),
            level: RiskLevel::Critical,
            description: format!("{} critical bottleneck(s) active", critical),
            mitigation: "Escalate and staff the affected resources first".to_string(),
        });
    }

    if trends.utilization_trend.direction == TrendDirection::Increasing {
        risks.push(RiskFactor {
            name: "rising_utilization".to_string(),
            level: if trends.utilization_trend.slope > STEEP_SLOPE {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            },
            description: format!(
                "Utilization trending up {:.1} points per period",
                trends.utilization_trend.slope
            ),
            mitigation: "Plan hiring ahead of the projected peak".to_string(),
        });
    }

    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::types::{
        Bottleneck, BottleneckStatus, BottleneckType, DataBasis, DepartmentUtilization,
        TrendAnalysis,
    };

    fn snapshot(overall: f64) -> UtilizationSnapshot {
        UtilizationSnapshot {
            period: "2026-W12".to_string(),
            overall,
            by_department: vec![],
            by_skill: vec![],
            basis: DataBasis::Measured,
        }
    }

    fn trends(slope: f64) -> CapacityTrends {
        let direction = crate::capacity::trend::classify_trend(slope);
        let flat = TrendAnalysis {
            direction,
            slope,
            intercept: 70.0,
            r_squared: 1.0,
            periods: 6,
        };
        CapacityTrends {
            points: vec![],
            utilization_trend: flat.clone(),
            demand_trend: flat,
            basis: DataBasis::Measured,
        }
    }

    fn bottleneck(impact: f64) -> Bottleneck {
        Bottleneck {
            bottleneck_type: BottleneckType::Skill,
            affected_resource: "Rust".to_string(),
            severity: Severity::from_impact(impact),
            impact,
            affected_projects: vec![],
            estimated_duration: 14,
            root_causes: vec![],
            recommended_actions: vec!["Hire two Rust engineers".to_string()],
            status: BottleneckStatus::Active,
        }
    }

    #[test]
    fn test_overloaded_org() {
        let mut util = snapshot(93.0);
        util.by_department.push(DepartmentUtilization {
            department: "Platform".to_string(),
            utilization: 98.0,
            available: 2.0,
            committed: 158.0,
        });
        let report = BottleneckReport {
            current: vec![bottleneck(92.0)],
            ..Default::default()
        };

        let recs = build_recommendations(&util, &report, &trends(3.0));
        assert_eq!(recs[0].category, RecommendationCategory::BottleneckResolution);
        assert_eq!(recs[0].priority, RiskLevel::Critical);
        assert_eq!(recs[0].description, "Hire two Rust engineers");
        assert!(recs.iter().any(|r| r.category == RecommendationCategory::Hiring));
        assert!(recs.iter().any(|r| r.title == "Relieve Platform"));
        assert!(recs.iter().any(|r| r.category == RecommendationCategory::Monitoring));
        for pair in recs.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }

        let risks = assess_risk_factors(&util, &report, &trends(3.0));
        let names: Vec<_> = risks.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["overutilization", "critical_bottlenecks", "rising_utilization"]);
        assert_eq!(risks[0].level, RiskLevel::High);
        assert_eq!(risks[2].level, RiskLevel::High);
    }

    #[test]
    fn test_quiet_org() {
        let recs = build_recommendations(&snapshot(72.0), &BottleneckReport::default(), &trends(0.0));
        assert!(recs.is_empty());
        assert!(assess_risk_factors(&snapshot(72.0), &BottleneckReport::default(), &trends(0.0)).is_empty());
    }

    #[test]
    fn test_underused_org() {
        let util = snapshot(40.0);
        let recs = build_recommendations(&util, &BottleneckReport::default(), &trends(-1.0));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Use idle capacity");

        let risks = assess_risk_factors(&util, &BottleneckReport::default(), &trends(-1.0));
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].name, "underutilization");
    }

    #[test]
    fn test_fallback_data_is_flagged() {
        let mut util = snapshot(75.0);
        util.basis = DataBasis::Fallback;
        let recs = build_recommendations(&util, &BottleneckReport::default(), &trends(0.0));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Improve data coverage");
    }
}
