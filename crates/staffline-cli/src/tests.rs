//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use chrono::NaiveDate;
use staffline_core::db::Database;
use staffline_core::{CapacityEngine, EngineConfig};

use crate::commands::{self, truncate, Output};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 17).unwrap()
}

fn seeded_db() -> Database {
    let db = Database::in_memory().unwrap();
    commands::cmd_seed_demo(&db, today()).unwrap();
    db
}

fn engine_for(db: &Database) -> CapacityEngine<Database> {
    CapacityEngine::new(db.clone(), EngineConfig::default()).with_reference_date(today())
}

fn scenario_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ========== Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Engineering", 20), "Engineering");
    assert_eq!(truncate("Platform Rewrite Phase Two", 10), "Platfor...");
    assert_eq!(truncate("Überstunden-Abteilung", 8), "Übers...");
}

#[test]
fn test_parse_date_arg() {
    assert_eq!(commands::parse_date_arg("--date", None).unwrap(), None);
    assert_eq!(
        commands::parse_date_arg("--date", Some("2026-03-16")).unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 16)
    );
    assert!(commands::parse_date_arg("--date", Some("16/03/2026")).is_err());
}

#[test]
fn test_open_db_unencrypted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("staffline.db");

    let db = commands::open_db(&path, true).unwrap();
    assert!(db.list_employees(None).unwrap().is_empty());
    assert!(path.exists());
}

#[test]
fn test_cmd_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("init.db");
    assert!(commands::cmd_init(&path, true).is_ok());
}

// ========== Seed and Snapshot Tests ==========

#[test]
fn test_cmd_seed_demo() {
    let db = seeded_db();

    assert_eq!(db.list_employees(None).unwrap().len(), 6);
    assert_eq!(db.list_employees(Some("engineering")).unwrap().len(), 3);
    assert_eq!(db.list_projects(None).unwrap().len(), 3);
    // Six allocations a week for 26 weeks, plus the pilot's second half
    assert_eq!(db.list_allocations(None, None).unwrap().len(), 26 * 6 + 13);
    assert_eq!(db.list_bottlenecks(None).unwrap().len(), 1);
}

#[test]
fn test_cmd_seed_demo_refuses_populated_database() {
    let db = seeded_db();
    assert!(commands::cmd_seed_demo(&db, today()).is_err());
}

#[test]
fn test_cmd_snapshot() {
    let db = seeded_db();
    let result = commands::cmd_snapshot(&db, Some(today()), Output::new(true));
    assert!(result.is_ok());

    let snapshots = db.record_capacity_snapshot(today()).unwrap();
    assert_eq!(snapshots.len(), 3);
}

#[test]
fn test_cmd_snapshot_empty_database() {
    let db = Database::in_memory().unwrap();
    assert!(commands::cmd_snapshot(&db, Some(today()), Output::default()).is_ok());
}

// ========== Report Tests ==========

#[tokio::test]
async fn test_seeded_engineering_runs_hot() {
    let db = seeded_db();
    let engine = engine_for(&db);

    let snapshot = engine.current_utilization(None, None).await.unwrap();
    let engineering = snapshot
        .by_department
        .iter()
        .find(|d| d.department == "Engineering")
        .unwrap();
    // 44 + 34 + 26 of 120 hours in the latest week
    assert!((engineering.utilization - 86.67).abs() < 0.01);

    assert!(commands::cmd_utilization(&engine, None, Output::default())
        .await
        .is_ok());
    assert!(
        commands::cmd_utilization(&engine, Some("Design"), Output::new(true))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_cmd_intelligence() {
    let db = seeded_db();
    let engine = engine_for(&db);

    assert!(commands::cmd_intelligence(&engine, None, Some(6), Output::default())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_cmd_intelligence_empty_database() {
    let db = Database::in_memory().unwrap();
    let engine = engine_for(&db);

    assert!(commands::cmd_intelligence(&engine, None, None, Output::default())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_cmd_bottlenecks() {
    let db = seeded_db();
    let engine = engine_for(&db);

    assert!(commands::cmd_bottlenecks(&engine, Some("high"), Output::default())
        .await
        .is_ok());
    assert!(commands::cmd_bottlenecks(&engine, Some("apocalyptic"), Output::default())
        .await
        .is_err());
}

#[tokio::test]
async fn test_cmd_patterns() {
    let db = seeded_db();
    let engine = engine_for(&db);

    assert!(commands::cmd_patterns(&engine, 6, "weekly", Output::default())
        .await
        .is_ok());
    assert!(commands::cmd_patterns(&engine, 6, "hourly", Output::default())
        .await
        .is_err());
    assert!(commands::cmd_patterns(&engine, 0, "monthly", Output::default())
        .await
        .is_err());
}

#[tokio::test]
async fn test_cmd_skills() {
    let db = seeded_db();
    let engine = engine_for(&db);

    assert!(commands::cmd_skills(&engine, Some(3), Output::default())
        .await
        .is_ok());
    assert!(commands::cmd_skills(&engine, Some(0), Output::default())
        .await
        .is_err());
}

#[tokio::test]
async fn test_cmd_skills_without_history() {
    let db = Database::in_memory().unwrap();
    let engine = engine_for(&db);

    assert!(commands::cmd_skills(&engine, None, Output::default())
        .await
        .is_err());
}

#[tokio::test]
async fn test_cmd_predict() {
    let db = seeded_db();
    let engine = engine_for(&db);

    let realistic = vec!["realistic".to_string()];
    assert!(commands::cmd_predict(&engine, Some(2), &realistic, Output::default())
        .await
        .is_ok());
    assert!(commands::cmd_predict(&engine, None, &[], Output::new(true))
        .await
        .is_ok());

    let unknown = vec!["wishful".to_string()];
    assert!(commands::cmd_predict(&engine, None, &unknown, Output::default())
        .await
        .is_err());
    assert!(commands::cmd_predict(&engine, Some(100), &[], Output::default())
        .await
        .is_err());
}

#[tokio::test]
async fn test_cmd_optimize() {
    let db = seeded_db();
    let engine = engine_for(&db);

    // Ada sits at 44 of 40 hours in the latest week
    let result = engine.optimize_allocation(None).await.unwrap();
    assert!(!result.suggestions.is_empty());

    assert!(commands::cmd_optimize(&engine, Output::default()).await.is_ok());
}

// ========== Scenario Tests ==========

#[test]
fn test_load_scenario_full_request() {
    let file = scenario_file(
        r#"{
            "changes": [{"type": "add_resources", "details": {"count": 2, "department": "Engineering"}}],
            "analysis_options": {"department": "Engineering"}
        }"#,
    );

    let request = commands::load_scenario(file.path()).unwrap();
    assert_eq!(request.changes.len(), 1);
    assert_eq!(request.changes[0].change_type, "add_resources");
    assert_eq!(
        request.analysis_options.department.as_deref(),
        Some("Engineering")
    );
}

#[test]
fn test_load_scenario_bare_changes() {
    let file = scenario_file(
        r#"[
            {"type": "add_project", "details": {"team_size": 3, "duration_weeks": 2}},
            {"type": "change_demand", "details": {"percentage": 15}}
        ]"#,
    );

    let request = commands::load_scenario(file.path()).unwrap();
    assert_eq!(request.changes.len(), 2);
    assert!(request.analysis_options.department.is_none());
}

#[test]
fn test_load_scenario_rejects_empty_and_invalid() {
    let empty = scenario_file("[]");
    assert!(commands::load_scenario(empty.path()).is_err());

    let invalid = scenario_file("{not json");
    assert!(commands::load_scenario(invalid.path()).is_err());

    let missing = std::path::Path::new("/nonexistent/scenario.json");
    assert!(commands::load_scenario(missing).is_err());
}

#[tokio::test]
async fn test_cmd_scenario() {
    let db = seeded_db();
    let engine = engine_for(&db);
    let file = scenario_file(
        r#"[
            {"type": "add_project", "details": {"team_size": 2, "duration_weeks": 4}},
            {"type": "reorg", "details": {}}
        ]"#,
    );

    assert!(commands::cmd_scenario(&engine, file.path(), Output::default())
        .await
        .is_ok());
}
