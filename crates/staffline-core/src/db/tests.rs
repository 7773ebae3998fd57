//! Database tests

use rusqlite::params;

use super::*;
use crate::capacity::gateway::{AllocationFilter, BottleneckFilter, CapacityGateway};
use crate::capacity::types::{BottleneckStatus, BottleneckType, DateRange, Granularity, Severity};
use crate::models::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn employee(db: &Database, name: &str, department: &str, hours: f64) -> i64 {
    db.create_employee(&NewEmployee {
        name: name.to_string(),
        department: department.to_string(),
        default_hours: hours,
    })
    .unwrap()
}

fn project(db: &Database, name: &str, status: ProjectStatus) -> i64 {
    db.create_project(&NewProject {
        name: name.to_string(),
        status,
        start_date: None,
        end_date: None,
    })
    .unwrap()
}

fn allocate(db: &Database, employee_id: i64, project_id: i64, week: NaiveDate, hours: f64) -> i64 {
    db.create_allocation(&NewAllocation {
        employee_id,
        project_id,
        week_start: week,
        allocated_hours: hours,
    })
    .unwrap()
}

fn bottleneck(resource: &str, impact: f64) -> NewBottleneck {
    NewBottleneck {
        bottleneck_type: BottleneckType::Skill,
        affected_resource: resource.to_string(),
        impact,
        affected_projects: vec![1, 2],
        estimated_duration_days: 14,
        root_causes: vec!["Too few holders".to_string()],
        recommended_actions: vec!["Cross-train".to_string()],
    }
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert!(db.list_employees(None).unwrap().is_empty());
    assert!(db.list_skills().unwrap().is_empty());
}

#[test]
fn test_schema_has_snapshot_uniqueness() {
    let db = Database::in_memory().unwrap();
    let conn = db.conn().unwrap();

    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('capacity_snapshots') \
             WHERE name IN ('snapshot_date', 'department', 'utilization', 'capacity_hours', 'demand_hours')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 5);

    conn.execute(
        "INSERT INTO capacity_snapshots (snapshot_date, department, utilization, capacity_hours, demand_hours) \
         VALUES ('2026-01-05', 'eng', 50, 100, 50)",
        [],
    )
    .unwrap();
    let dup = conn.execute(
        "INSERT INTO capacity_snapshots (snapshot_date, department, utilization, capacity_hours, demand_hours) \
         VALUES ('2026-01-05', 'eng', 60, 100, 60)",
        [],
    );
    assert!(dup.is_err());
}

#[test]
fn test_employee_crud() {
    let db = Database::in_memory().unwrap();

    let id = employee(&db, "  Ada  ", "Engineering", 40.0);
    let fetched = db.get_employee(id).unwrap().unwrap();
    assert_eq!(fetched.name, "Ada");
    assert_eq!(fetched.status, EmployeeStatus::Active);

    employee(&db, "Grace", "Design", 32.0);
    assert_eq!(db.list_employees(None).unwrap().len(), 2);
    assert_eq!(db.list_employees(Some("engineering")).unwrap().len(), 1);

    db.set_employee_status(id, EmployeeStatus::Inactive).unwrap();
    assert_eq!(
        db.get_employee(id).unwrap().unwrap().status,
        EmployeeStatus::Inactive
    );

    assert!(db.get_employee(9999).unwrap().is_none());
    assert!(matches!(
        db.set_employee_status(9999, EmployeeStatus::Active),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_employee_validation() {
    let db = Database::in_memory().unwrap();

    let blank = db.create_employee(&NewEmployee {
        name: " ".to_string(),
        department: "Engineering".to_string(),
        default_hours: 40.0,
    });
    assert!(matches!(blank, Err(Error::InvalidData(_))));

    let negative = db.create_employee(&NewEmployee {
        name: "Ada".to_string(),
        department: "Engineering".to_string(),
        default_hours: -1.0,
    });
    assert!(matches!(negative, Err(Error::InvalidData(_))));
}

#[test]
fn test_skill_upsert_is_case_insensitive() {
    let db = Database::in_memory().unwrap();

    let id = db.upsert_skill("Rust", SkillCategory::Technical).unwrap();
    let again = db.upsert_skill("rust", SkillCategory::Other).unwrap();
    assert_eq!(id, again);

    let skills = db.list_skills().unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].category, SkillCategory::Technical);
}

#[test]
fn test_assign_skill_replaces_level() {
    let db = Database::in_memory().unwrap();
    db.upsert_skill("Rust", SkillCategory::Technical).unwrap();
    let ada = employee(&db, "Ada", "Engineering", 40.0);

    db.assign_skill(ada, "Rust", ProficiencyLevel::Beginner).unwrap();
    db.assign_skill(ada, "rust", ProficiencyLevel::Expert).unwrap();

    let skills = db.list_employee_skills(ada).unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].level, ProficiencyLevel::Expert);

    assert!(matches!(
        db.assign_skill(ada, "Cobol", ProficiencyLevel::Expert),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_project_requirements() {
    let db = Database::in_memory().unwrap();
    db.upsert_skill("Rust", SkillCategory::Technical).unwrap();
    let p = project(&db, "Platform", ProjectStatus::Active);

    db.set_project_requirement(p, "Rust", 2).unwrap();
    db.set_project_requirement(p, "Rust", 3).unwrap();

    let reqs = db.list_project_requirements(p).unwrap();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].quantity, 3);

    assert!(matches!(
        db.set_project_requirement(p, "Rust", -1),
        Err(Error::InvalidData(_))
    ));

    db.update_project_status(p, ProjectStatus::Completed).unwrap();
    assert_eq!(db.list_projects(Some(ProjectStatus::Active)).unwrap().len(), 0);
    assert_eq!(db.list_projects(Some(ProjectStatus::Completed)).unwrap().len(), 1);
}

#[test]
fn test_project_dates_must_be_ordered() {
    let db = Database::in_memory().unwrap();
    let result = db.create_project(&NewProject {
        name: "Backwards".to_string(),
        status: ProjectStatus::Planning,
        start_date: Some(date(2026, 5, 1)),
        end_date: Some(date(2026, 4, 1)),
    });
    assert!(matches!(result, Err(Error::InvalidData(_))));
}

#[test]
fn test_allocation_rules() {
    let db = Database::in_memory().unwrap();
    let ada = employee(&db, "Ada", "Engineering", 40.0);
    let p = project(&db, "Platform", ProjectStatus::Active);

    // 2026-03-16 is a Monday
    let id = allocate(&db, ada, p, date(2026, 3, 16), 30.0);
    assert!(id > 0);

    let tuesday = db.create_allocation(&NewAllocation {
        employee_id: ada,
        project_id: p,
        week_start: date(2026, 3, 17),
        allocated_hours: 10.0,
    });
    assert!(matches!(tuesday, Err(Error::InvalidData(_))));

    let unknown = db.create_allocation(&NewAllocation {
        employee_id: 999,
        project_id: p,
        week_start: date(2026, 3, 16),
        allocated_hours: 10.0,
    });
    assert!(matches!(unknown, Err(Error::NotFound(_))));

    let in_march = db
        .list_allocations(Some(DateRange::new(date(2026, 3, 1), date(2026, 3, 31))), None)
        .unwrap();
    assert_eq!(in_march.len(), 1);
    assert_eq!(in_march[0].week_start, date(2026, 3, 16));

    let in_april = db
        .list_allocations(Some(DateRange::new(date(2026, 4, 1), date(2026, 4, 30))), None)
        .unwrap();
    assert!(in_april.is_empty());

    assert!(db.delete_allocation(id).unwrap());
    assert!(!db.delete_allocation(id).unwrap());
}

#[test]
fn test_bottleneck_lifecycle() {
    let db = Database::in_memory().unwrap();

    let id = db.record_bottleneck(&bottleneck("Rust", 85.0)).unwrap();
    db.record_bottleneck(&bottleneck("Design", 30.0)).unwrap();

    let active = db.list_bottlenecks(Some(BottleneckStatus::Active)).unwrap();
    assert_eq!(active.len(), 2);
    let rust = active.iter().find(|b| b.id == id).unwrap();
    assert_eq!(rust.severity, Severity::High);

    let rows = db
        .query_bottlenecks(&BottleneckFilter {
            severity: Some(Severity::High),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].affected_projects, vec![1, 2]);
    assert_eq!(rows[0].root_causes, vec!["Too few holders".to_string()]);

    db.resolve_bottleneck(id).unwrap();
    assert!(matches!(db.resolve_bottleneck(id), Err(Error::NotFound(_))));

    let resolved = db.list_bottlenecks(Some(BottleneckStatus::Resolved)).unwrap();
    assert_eq!(resolved.len(), 1);
    assert!(resolved[0].resolved_at.is_some());

    let out_of_range = db.record_bottleneck(&bottleneck("Rust", 120.0));
    assert!(matches!(out_of_range, Err(Error::InvalidData(_))));
}

#[test]
fn test_corrupt_timestamps_are_errors() {
    let db = Database::in_memory().unwrap();
    let id = db.record_bottleneck(&bottleneck("Rust", 80.0)).unwrap();
    db.conn()
        .unwrap()
        .execute(
            "UPDATE bottlenecks SET identified_at = 'yesterday-ish' WHERE id = ?",
            params![id],
        )
        .unwrap();

    let result = db.query_bottlenecks(&BottleneckFilter::default());
    assert!(matches!(result, Err(Error::InvalidData(_))));

    let ada = employee(&db, "Ada", "Engineering", 40.0);
    db.conn()
        .unwrap()
        .execute(
            "UPDATE employees SET created_at = 'not a time' WHERE id = ?",
            params![ada],
        )
        .unwrap();
    assert!(db.list_employees(None).is_err());
}

#[test]
fn test_bottleneck_since_filter() {
    let db = Database::in_memory().unwrap();
    let old = db.record_bottleneck(&bottleneck("Old", 50.0)).unwrap();
    let recent = db.record_bottleneck(&bottleneck("Recent", 50.0)).unwrap();

    let long_ago = date(2025, 1, 10).and_hms_opt(9, 0, 0).unwrap().and_utc();
    let lately = date(2026, 6, 1).and_hms_opt(9, 0, 0).unwrap().and_utc();
    db.set_bottleneck_timestamps(old, long_ago, Some(long_ago)).unwrap();
    db.set_bottleneck_timestamps(recent, long_ago, Some(lately)).unwrap();

    let rows = db
        .query_bottlenecks(&BottleneckFilter {
            status: Some(BottleneckStatus::Resolved),
            since: Some(date(2026, 1, 1)),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].affected_resource, "Recent");
}

#[test]
fn test_capacity_snapshot_record_and_query() {
    let db = Database::in_memory().unwrap();
    let ada = employee(&db, "Ada", "Engineering", 40.0);
    let bob = employee(&db, "Bob", "Engineering", 40.0);
    let cy = employee(&db, "Cy", "Design", 40.0);
    let p = project(&db, "Platform", ProjectStatus::Active);

    allocate(&db, ada, p, date(2026, 3, 16), 40.0);
    allocate(&db, bob, p, date(2026, 3, 16), 20.0);
    allocate(&db, cy, p, date(2026, 3, 16), 10.0);

    let snaps = db.record_capacity_snapshot(date(2026, 3, 20)).unwrap();
    assert_eq!(snaps.len(), 2);
    let eng = snaps.iter().find(|s| s.department == "Engineering").unwrap();
    assert_eq!(eng.capacity_hours, 80.0);
    assert_eq!(eng.demand_hours, 60.0);
    assert_eq!(eng.utilization, 75.0);

    // Re-recording the same date replaces rather than duplicates
    db.record_capacity_snapshot(date(2026, 3, 20)).unwrap();
    let conn = db.conn().unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM capacity_snapshots", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 2);
    drop(conn);

    let series = db
        .query_capacity_snapshots(
            DateRange::new(date(2026, 3, 1), date(2026, 3, 31)),
            Granularity::Monthly,
        )
        .unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].period, "2026-03");
    assert_eq!(series[0].bucket_start, date(2026, 3, 1));
    assert_eq!(series[0].avg_capacity, 120.0);
    assert_eq!(series[0].avg_demand, 70.0);
    assert!((series[0].avg_utilization - 58.333).abs() < 0.01);

    let weekly = db
        .query_capacity_snapshots(
            DateRange::new(date(2026, 3, 1), date(2026, 3, 31)),
            Granularity::Weekly,
        )
        .unwrap();
    assert_eq!(weekly[0].period, "2026-W12");
    assert_eq!(weekly[0].bucket_start, date(2026, 3, 16));
}

#[test]
fn test_skill_supply_and_demand() {
    let db = Database::in_memory().unwrap();
    db.upsert_skill("Rust", SkillCategory::Technical).unwrap();
    db.upsert_skill("Figma", SkillCategory::Technical).unwrap();
    db.upsert_skill("Cobol", SkillCategory::Technical).unwrap();

    let ada = employee(&db, "Ada", "Engineering", 40.0);
    let bob = employee(&db, "Bob", "Engineering", 40.0);
    let gone = employee(&db, "Gone", "Engineering", 40.0);
    db.assign_skill(ada, "Rust", ProficiencyLevel::Expert).unwrap();
    db.assign_skill(bob, "Rust", ProficiencyLevel::Intermediate).unwrap();
    db.assign_skill(gone, "Rust", ProficiencyLevel::Expert).unwrap();
    db.set_employee_status(gone, EmployeeStatus::Inactive).unwrap();

    let supply = db.query_skill_supply().unwrap();
    assert_eq!(supply.len(), 3);
    let rust = supply.iter().find(|s| s.skill == "Rust").unwrap();
    assert_eq!(rust.current_supply, 2);
    assert_eq!(rust.avg_proficiency, 3.0);
    let cobol = supply.iter().find(|s| s.skill == "Cobol").unwrap();
    assert_eq!(cobol.current_supply, 0);
    assert_eq!(cobol.avg_proficiency, 0.0);

    let active = project(&db, "Platform", ProjectStatus::Active);
    let planned = project(&db, "Mobile", ProjectStatus::Planning);
    let done = project(&db, "Legacy", ProjectStatus::Completed);
    db.set_project_requirement(active, "Rust", 2).unwrap();
    db.set_project_requirement(planned, "Rust", 1).unwrap();
    db.set_project_requirement(done, "Rust", 5).unwrap();
    db.set_project_requirement(done, "Cobol", 3).unwrap();

    let demand = db.query_skill_demand().unwrap();
    assert_eq!(demand.len(), 1);
    assert_eq!(demand[0].skill, "Rust");
    assert_eq!(demand[0].projects_requiring, 2);
    assert_eq!(demand[0].total_demand, 3);
}

#[test]
fn test_skill_demand_out_of_range() {
    let db = Database::in_memory().unwrap();
    db.upsert_skill("Rust", SkillCategory::Technical).unwrap();
    let p = project(&db, "Platform", ProjectStatus::Active);

    assert!(matches!(
        db.set_project_requirement(p, "Rust", 4_294_967_297),
        Err(Error::InvalidData(_))
    ));
    db.set_project_requirement(p, "Rust", MAX_REQUIREMENT_QUANTITY)
        .unwrap();

    // A total past u32 is rejected on read instead of wrapping
    db.conn()
        .unwrap()
        .execute(
            "UPDATE project_skill_requirements SET quantity = 4294967297",
            [],
        )
        .unwrap();
    assert!(matches!(
        db.query_skill_demand(),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn test_workforce_and_allocation_records() {
    let db = Database::in_memory().unwrap();
    db.upsert_skill("Rust", SkillCategory::Technical).unwrap();
    db.upsert_skill("Figma", SkillCategory::Technical).unwrap();

    let ada = employee(&db, "Ada", "Engineering", 40.0);
    let cy = employee(&db, "Cy", "Design", 40.0);
    db.assign_skill(ada, "Rust", ProficiencyLevel::Advanced).unwrap();
    db.assign_skill(cy, "Figma", ProficiencyLevel::Expert).unwrap();

    let p = project(&db, "Platform", ProjectStatus::Active);
    db.set_project_requirement(p, "Rust", 1).unwrap();

    allocate(&db, ada, p, date(2026, 3, 2), 40.0);
    allocate(&db, ada, p, date(2026, 3, 9), 20.0);
    allocate(&db, cy, p, date(2026, 3, 9), 10.0);
    // Outside the queried range
    allocate(&db, ada, p, date(2026, 4, 6), 40.0);

    let range = DateRange::new(date(2026, 3, 2), date(2026, 3, 15));

    let everyone = db.query_workforce(range, &AllocationFilter::default()).unwrap();
    assert_eq!(everyone.len(), 2);
    let ada_row = everyone.iter().find(|m| m.employee_id == ada).unwrap();
    assert_eq!(ada_row.allocated_hours, 60.0);
    assert_eq!(ada_row.skills.len(), 1);
    assert_eq!(ada_row.skills[0].skill, "Rust");

    let design = db
        .query_workforce(range, &AllocationFilter::department(Some("design")))
        .unwrap();
    assert_eq!(design.len(), 1);
    assert_eq!(design[0].allocated_hours, 10.0);

    let records = db
        .query_allocation_records(range, &AllocationFilter::default())
        .unwrap();
    assert_eq!(records.len(), 2);
    let ada_record = records.iter().find(|r| r.employee_id == ada).unwrap();
    // 60 hours over a two-week range
    assert_eq!(ada_record.allocated_hours, 30.0);
    assert_eq!(ada_record.required_skills, vec!["Rust".to_string()]);
    assert_eq!(ada_record.department.as_deref(), Some("Engineering"));
    let cy_record = records.iter().find(|r| r.employee_id == cy).unwrap();
    assert_eq!(cy_record.employee_skills, vec!["Figma".to_string()]);
}

#[test]
fn test_skill_history_by_month() {
    let db = Database::in_memory().unwrap();
    db.upsert_skill("Rust", SkillCategory::Technical).unwrap();
    let ada = employee(&db, "Ada", "Engineering", 40.0);
    db.assign_skill(ada, "Rust", ProficiencyLevel::Advanced).unwrap();
    let p = project(&db, "Platform", ProjectStatus::Active);

    allocate(&db, ada, p, date(2026, 1, 5), 40.0);
    allocate(&db, ada, p, date(2026, 1, 12), 40.0);
    allocate(&db, ada, p, date(2026, 2, 2), 40.0);

    let history = db
        .query_skill_history(DateRange::new(date(2026, 1, 1), date(2026, 2, 28)))
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].period, "2026-01");
    assert_eq!(history[0].allocation_count, 2);
    assert_eq!(history[1].period, "2026-02");
    assert_eq!(history[1].allocation_count, 1);
}

#[tokio::test]
async fn test_gateway_reads_from_store() {
    let db = Database::in_memory().unwrap();
    db.record_bottleneck(&bottleneck("Rust", 95.0)).unwrap();
    db.upsert_skill("Rust", SkillCategory::Technical).unwrap();

    let rows = db
        .fetch_bottlenecks(&BottleneckFilter {
            status: Some(BottleneckStatus::Active),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].impact, 95.0);

    let supply = db.fetch_skill_supply().await.unwrap();
    assert_eq!(supply.len(), 1);

    let snapshots = db
        .fetch_capacity_snapshots(
            DateRange::new(date(2026, 1, 1), date(2026, 6, 30)),
            Granularity::Monthly,
        )
        .await
        .unwrap();
    assert!(snapshots.is_empty());
}

#[test]
fn test_audit_log() {
    let db = Database::in_memory().unwrap();
    db.log_audit("planner@example.com", "scenario", Some("scenario"), None, Some("hire"))
        .unwrap();
    db.log_audit("planner@example.com", "utilization", None, None, None)
        .unwrap();

    let entries = db.list_audit_log(&AuditFilter::default(), 10).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, "utilization");

    let scenarios = AuditFilter {
        entity_type: Some("scenario".to_string()),
        ..Default::default()
    };
    let entries = db.list_audit_log(&scenarios, 10).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].details.as_deref(), Some("hire"));

    let none = AuditFilter {
        action: Some("delete".to_string()),
        ..Default::default()
    };
    assert!(db.list_audit_log(&none, 10).unwrap().is_empty());
}
