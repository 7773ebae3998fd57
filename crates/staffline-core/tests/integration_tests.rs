//! Integration tests for staffline-core
//!
//! These tests exercise the full record -> snapshot -> analyze workflow with
//! the capacity engine reading from a real SQLite store.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use staffline_core::{
    capacity::{
        BottleneckType, DataBasis, Granularity, IntelligenceFilters, PatternOptions, PredictionOptions,
        PredictionScenario, ScenarioChange, ScenarioChangeDetails, ScenarioRequest, Severity,
        SuggestionType, TrendDirection,
    },
    db::Database,
    models::{
        NewAllocation, NewBottleneck, NewEmployee, NewProject, ProficiencyLevel, ProjectStatus,
        SkillCategory,
    },
    CapacityEngine, EngineConfig, Error,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn reference() -> NaiveDate {
    // A Monday
    date(2026, 6, 15)
}

struct Seeded {
    db: Database,
    ada: i64,
    cy: i64,
}

/// Two engineers and one designer on one project from January to mid June
///
/// Ada's load grows every month and exceeds her contract in June; Bob and Cy
/// are flat. One snapshot is recorded per month.
fn seeded() -> Seeded {
    let db = Database::in_memory().expect("Failed to create in-memory database");

    db.upsert_skill("Rust", SkillCategory::Technical).unwrap();
    db.upsert_skill("Figma", SkillCategory::Technical).unwrap();

    let new = |name: &str, department: &str| {
        db.create_employee(&NewEmployee {
            name: name.to_string(),
            department: department.to_string(),
            default_hours: 40.0,
        })
        .unwrap()
    };
    let ada = new("Ada", "Engineering");
    let bob = new("Bob", "Engineering");
    let cy = new("Cy", "Design");

    db.assign_skill(ada, "Rust", ProficiencyLevel::Expert).unwrap();
    db.assign_skill(bob, "Rust", ProficiencyLevel::Intermediate).unwrap();
    db.assign_skill(cy, "Figma", ProficiencyLevel::Advanced).unwrap();

    let platform = db
        .create_project(&NewProject {
            name: "Platform".to_string(),
            status: ProjectStatus::Active,
            start_date: Some(date(2026, 1, 5)),
            end_date: None,
        })
        .unwrap();
    db.set_project_requirement(platform, "Rust", 4).unwrap();

    let ada_hours = |month: u32| match month {
        1 => 20.0,
        2 => 24.0,
        3 => 28.0,
        4 => 32.0,
        5 => 36.0,
        _ => 44.0,
    };

    let mut week = date(2026, 1, 5);
    assert_eq!(week.weekday(), Weekday::Mon);
    while week <= reference() {
        for (employee_id, hours) in [
            (ada, ada_hours(week.month())),
            (bob, 20.0),
            (cy, 10.0),
        ] {
            db.create_allocation(&NewAllocation {
                employee_id,
                project_id: platform,
                week_start: week,
                allocated_hours: hours,
            })
            .unwrap();
        }
        week += Duration::weeks(1);
    }

    for snapshot_date in [
        date(2026, 1, 28),
        date(2026, 2, 25),
        date(2026, 3, 25),
        date(2026, 4, 29),
        date(2026, 5, 27),
        date(2026, 6, 14),
    ] {
        db.record_capacity_snapshot(snapshot_date).unwrap();
    }

    Seeded { db, ada, cy }
}

fn engine(db: &Database) -> CapacityEngine<Database> {
    CapacityEngine::new(db.clone(), EngineConfig::default()).with_reference_date(reference())
}

// =============================================================================
// Utilization and trends
// =============================================================================

#[tokio::test]
async fn test_current_utilization_from_store() {
    let seeded = seeded();
    let engine = engine(&seeded.db);

    let snapshot = engine.current_utilization(None, None).await.unwrap();
    assert_eq!(snapshot.basis, DataBasis::Measured);
    // (44 + 20 + 10) / 120
    assert!((snapshot.overall - 61.67).abs() < 0.01);

    let eng = snapshot
        .by_department
        .iter()
        .find(|d| d.department == "Engineering")
        .unwrap();
    assert_eq!(eng.committed, 64.0);
    assert_eq!(eng.utilization, 80.0);

    let design = engine.current_utilization(Some("Design"), None).await.unwrap();
    assert_eq!(design.overall, 25.0);
    assert_eq!(design.by_department.len(), 1);
}

#[tokio::test]
async fn test_capacity_trends_follow_snapshots() {
    let seeded = seeded();
    let engine = engine(&seeded.db);

    let trends = engine.capacity_trends(None).await.unwrap();
    assert_eq!(trends.points.len(), 6);
    assert_eq!(trends.points[0].period, "2026-01");
    assert_eq!(trends.points[5].period, "2026-06");
    assert_eq!(trends.utilization_trend.direction, TrendDirection::Increasing);
    assert_eq!(trends.basis, DataBasis::Measured);
}

#[tokio::test]
async fn test_weekly_patterns_use_iso_weeks() {
    let seeded = seeded();
    let engine = engine(&seeded.db);

    let patterns = engine
        .analyze_utilization_patterns(&PatternOptions {
            period_months: 6,
            granularity: Granularity::Weekly,
        })
        .await
        .unwrap();
    assert_eq!(patterns.patterns.len(), 6);
    assert!(patterns.patterns.iter().all(|p| p.period.contains("-W")));
}

// =============================================================================
// Predictions
// =============================================================================

#[tokio::test]
async fn test_predictions_from_snapshot_history() {
    let seeded = seeded();
    let engine = engine(&seeded.db);

    let predictions = engine
        .get_capacity_predictions(&PredictionOptions {
            horizon: 3,
            scenarios: vec![PredictionScenario::Optimistic, PredictionScenario::Realistic],
        })
        .await
        .unwrap();
    assert_eq!(predictions.len(), 2);
    for prediction in &predictions {
        assert_eq!(prediction.basis, DataBasis::Measured);
        assert_eq!(prediction.points.len(), 3);
        assert_eq!(prediction.points[0].period, "2026-07");
        assert!((0.0..=100.0).contains(&prediction.predicted_utilization));
    }
}

#[tokio::test]
async fn test_predictions_need_three_periods() {
    let db = Database::in_memory().unwrap();
    db.create_employee(&NewEmployee {
        name: "Ada".to_string(),
        department: "Engineering".to_string(),
        default_hours: 40.0,
    })
    .unwrap();
    db.record_capacity_snapshot(date(2026, 5, 27)).unwrap();
    db.record_capacity_snapshot(date(2026, 6, 14)).unwrap();

    let result = engine(&db)
        .get_capacity_predictions(&PredictionOptions {
            horizon: 3,
            scenarios: PredictionScenario::all(),
        })
        .await;
    assert!(matches!(result, Err(Error::InsufficientData { .. })));
}

// =============================================================================
// Bottlenecks and scenarios
// =============================================================================

#[tokio::test]
async fn test_recorded_bottleneck_is_current() {
    let seeded = seeded();
    seeded
        .db
        .record_bottleneck(&NewBottleneck {
            bottleneck_type: BottleneckType::Skill,
            affected_resource: "Rust".to_string(),
            impact: 95.0,
            affected_projects: vec![1],
            estimated_duration_days: 21,
            root_causes: vec!["Two holders for four requested seats".to_string()],
            recommended_actions: vec!["Hire".to_string()],
        })
        .unwrap();

    let report = engine(&seeded.db).identify_bottlenecks(None).await.unwrap();
    assert_eq!(report.current.len(), 1);
    assert_eq!(report.current[0].severity, Severity::Critical);
    assert!(report.historical.is_empty());

    let low_only = engine(&seeded.db)
        .identify_bottlenecks(Some(Severity::Low))
        .await
        .unwrap();
    assert!(low_only.current.is_empty());
}

#[tokio::test]
async fn test_scenario_against_department_baseline() {
    let seeded = seeded();
    let engine = engine(&seeded.db);

    let request = ScenarioRequest {
        changes: vec![ScenarioChange::new(
            "change_demand",
            ScenarioChangeDetails {
                percentage: Some(10.0),
                department: Some("Engineering".to_string()),
                ..Default::default()
            },
        )],
        analysis_options: Default::default(),
    };

    let result = engine.run_scenario_analysis(&request).await.unwrap();
    assert!(result.warnings.is_empty());
    assert_eq!(result.baseline_basis, DataBasis::Measured);
    // 10% of 64 committed hours
    assert!((result.capacity_impact.total_demand_change - 6.4).abs() < 1e-9);

    let eng = &result.capacity_impact.department_impacts[0];
    assert_eq!(eng.department, "Engineering");
    assert_eq!(eng.baseline_utilization, 80.0);
    assert!((eng.projected_utilization - 88.0).abs() < 1e-9);
}

// =============================================================================
// Skills and optimization
// =============================================================================

#[tokio::test]
async fn test_skill_forecast_from_store() {
    let seeded = seeded();
    let report = engine(&seeded.db).forecast_skill_demand(3).await.unwrap();

    assert_eq!(report.horizon_months, 3);
    let rust = report
        .skill_demand
        .iter()
        .find(|f| f.skill == "Rust")
        .unwrap();
    assert_eq!(rust.current_supply, 2);
    assert!((0.1..=0.95).contains(&rust.confidence));
}

#[tokio::test]
async fn test_skill_forecast_without_history_is_insufficient() {
    let db = Database::in_memory().unwrap();
    db.upsert_skill("Rust", SkillCategory::Technical).unwrap();

    let result = engine(&db).forecast_skill_demand(3).await;
    assert!(matches!(result, Err(Error::InsufficientData { .. })));
}

#[tokio::test]
async fn test_optimizer_reads_current_allocations() {
    let seeded = seeded();
    let result = engine(&seeded.db).optimize_allocation(None).await.unwrap();

    let ada_over = result
        .suggestions
        .iter()
        .find(|s| s.employee_id == seeded.ada && s.suggestion_type == SuggestionType::CapacityAdjustment)
        .expect("over-allocation suggestion for Ada");
    assert_eq!(ada_over.adjustment, Some(-4.0));

    // Cy holds Figma on a Rust project at a quarter of contract
    let cy_moves: Vec<_> = result
        .suggestions
        .iter()
        .filter(|s| s.employee_id == seeded.cy)
        .collect();
    assert!(cy_moves
        .iter()
        .any(|s| s.suggestion_type == SuggestionType::Reassignment));
    assert!(!result.implementation.is_empty());
}

// =============================================================================
// Intelligence report
// =============================================================================

#[tokio::test]
async fn test_intelligence_report_end_to_end() {
    let seeded = seeded();
    let report = engine(&seeded.db)
        .get_capacity_intelligence(&IntelligenceFilters::default())
        .await
        .unwrap();

    assert!(report.degraded_sections.is_empty());
    assert_eq!(report.current_utilization.basis, DataBasis::Measured);
    assert_eq!(report.capacity_trends.points.len(), 6);
    assert_eq!(report.predictions.len(), 3);
    assert!(report
        .predictions
        .iter()
        .all(|p| p.basis == DataBasis::Measured));
}

#[tokio::test]
async fn test_intelligence_report_on_empty_store() {
    let db = Database::in_memory().unwrap();
    let report = engine(&db)
        .get_capacity_intelligence(&IntelligenceFilters::default())
        .await
        .unwrap();

    assert!(report.degraded_sections.is_empty());
    assert_eq!(report.current_utilization.basis, DataBasis::Fallback);
    assert_eq!(report.current_utilization.overall, 75.0);
    assert!(report
        .predictions
        .iter()
        .all(|p| p.basis == DataBasis::Fallback));
}
