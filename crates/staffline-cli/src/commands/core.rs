//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` / `open_engine` - Shared utilities to open the database and engine
//! - `cmd_init` - Initialize the database
//! - `cmd_seed_demo` - Load a demo organization with history
//! - `cmd_snapshot` - Record a capacity snapshot

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDate};
use staffline_core::capacity::BottleneckType;
use staffline_core::db::Database;
use staffline_core::models::{
    NewAllocation, NewBottleneck, NewEmployee, NewProject, ProficiencyLevel, ProjectStatus,
    SkillCategory,
};
use staffline_core::{CapacityEngine, EngineConfig};

use super::Output;

/// Weeks of allocation history the demo organization carries
const DEMO_WEEKS: i64 = 26;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Open the database and build an engine with the resolved config
pub fn open_engine(
    db_path: &Path,
    config_path: Option<&Path>,
    no_encrypt: bool,
) -> Result<CapacityEngine<Database>> {
    let db = open_db(db_path, no_encrypt)?;
    let config = EngineConfig::load(config_path).context("Failed to load engine config")?;
    Ok(CapacityEngine::new(db, config))
}

/// Parse an optional YYYY-MM-DD argument
pub fn parse_date_arg(flag: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .with_context(|| format!("Invalid {} date format (use YYYY-MM-DD)", flag))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let _db = open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Load demo data: staffline seed-demo");
    println!("  2. See where capacity stands: staffline intelligence");
    println!("  3. Start web API: staffline serve");

    Ok(())
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Load a demo organization with `DEMO_WEEKS` of allocations ending the week of `today`
///
/// Engineering ramps towards over-allocation, design peaks every fourth week,
/// and operations picks up a pilot halfway through. One snapshot is recorded
/// per week so trends, patterns and predictions have history to work with.
pub fn cmd_seed_demo(db: &Database, today: NaiveDate) -> Result<()> {
    if !db.list_employees(None)?.is_empty() {
        anyhow::bail!("Database already has employees; seed-demo only runs on an empty database");
    }

    println!("🌱 Seeding demo organization...");

    let skills = [
        ("Rust", SkillCategory::Technical),
        ("TypeScript", SkillCategory::Technical),
        ("Figma", SkillCategory::Technical),
        ("Communication", SkillCategory::Soft),
        ("Logistics", SkillCategory::Domain),
    ];
    for (name, category) in skills {
        db.upsert_skill(name, category)?;
    }

    let staff = [
        ("Ada", "Engineering", 40.0, vec![("Rust", ProficiencyLevel::Expert), ("TypeScript", ProficiencyLevel::Advanced)]),
        ("Bob", "Engineering", 40.0, vec![("Rust", ProficiencyLevel::Intermediate)]),
        ("Grace", "Engineering", 40.0, vec![("TypeScript", ProficiencyLevel::Expert), ("Communication", ProficiencyLevel::Advanced)]),
        ("Cy", "Design", 40.0, vec![("Figma", ProficiencyLevel::Expert)]),
        ("Dee", "Design", 32.0, vec![("Figma", ProficiencyLevel::Intermediate), ("Communication", ProficiencyLevel::Expert)]),
        ("Eve", "Operations", 40.0, vec![("Logistics", ProficiencyLevel::Advanced)]),
    ];
    let mut employees = Vec::new();
    for (name, department, hours, held) in staff {
        let id = db.create_employee(&NewEmployee {
            name: name.to_string(),
            department: department.to_string(),
            default_hours: hours,
        })?;
        for (skill, level) in held {
            db.assign_skill(id, skill, level)?;
        }
        employees.push(id);
    }
    println!("   👥 {} employees in 3 departments", employees.len());

    let first_week = monday_of(today) - Duration::weeks(DEMO_WEEKS - 1);
    let projects = [
        ("Platform Rewrite", ProjectStatus::Active, vec![("Rust", 2), ("TypeScript", 1)]),
        ("Design System", ProjectStatus::Active, vec![("Figma", 2), ("TypeScript", 1)]),
        ("Warehouse Pilot", ProjectStatus::Planning, vec![("Logistics", 2), ("Rust", 1)]),
    ];
    let mut project_ids = Vec::new();
    for (name, status, requirements) in projects {
        let id = db.create_project(&NewProject {
            name: name.to_string(),
            status,
            start_date: Some(first_week),
            end_date: None,
        })?;
        for (skill, quantity) in requirements {
            db.set_project_requirement(id, skill, quantity)?;
        }
        project_ids.push(id);
    }
    println!("   📁 {} projects", project_ids.len());

    let (platform, design_system, pilot) = (project_ids[0], project_ids[1], project_ids[2]);
    let (ada, bob, grace, cy, dee, eve) = (
        employees[0],
        employees[1],
        employees[2],
        employees[3],
        employees[4],
        employees[5],
    );

    let mut allocation_count = 0;
    let mut snapshot_count = 0;
    for week in 0..DEMO_WEEKS {
        let week_start = first_week + Duration::weeks(week);
        let ramp = week as f64 / (DEMO_WEEKS - 1) as f64;
        let design_peak = if week % 4 == 3 { 8.0 } else { 0.0 };

        let mut plan = vec![
            (ada, platform, 30.0 + 14.0 * ramp),
            (bob, platform, 24.0 + 10.0 * ramp),
            (grace, design_system, 16.0 + design_peak),
            (grace, platform, 10.0),
            (cy, design_system, 20.0 + design_peak),
            (dee, design_system, 12.0),
        ];
        if week >= DEMO_WEEKS / 2 {
            plan.push((eve, pilot, 10.0));
        }

        for (employee_id, project_id, hours) in plan {
            db.create_allocation(&NewAllocation {
                employee_id,
                project_id,
                week_start,
                allocated_hours: hours.round(),
            })?;
            allocation_count += 1;
        }

        let snapshot_date = (week_start + Duration::days(6)).min(today);
        snapshot_count += db.record_capacity_snapshot(snapshot_date)?.len();
    }
    println!(
        "   📅 {} allocations over {} weeks, {} snapshot rows",
        allocation_count, DEMO_WEEKS, snapshot_count
    );

    db.record_bottleneck(&NewBottleneck {
        bottleneck_type: BottleneckType::Skill,
        affected_resource: "Rust".to_string(),
        impact: 82.0,
        affected_projects: vec![platform, pilot],
        estimated_duration_days: 21,
        root_causes: vec!["Two Rust engineers cover three projects".to_string()],
        recommended_actions: vec![
            "Hire a Rust engineer".to_string(),
            "Cross-train a TypeScript engineer".to_string(),
        ],
    })?;
    println!("   🚧 1 active bottleneck");

    println!("✅ Demo data loaded. Try: staffline intelligence");
    Ok(())
}

pub fn cmd_snapshot(db: &Database, date: Option<NaiveDate>, output: Output) -> Result<()> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let snapshots = db
        .record_capacity_snapshot(date)
        .context("Failed to record capacity snapshot")?;

    output.emit(&snapshots, |snapshots| {
        println!();
        println!("📸 Capacity snapshot for the week ending {}", date);
        println!("   ─────────────────────────────────────────────────────");
        if snapshots.is_empty() {
            println!("   No active employees to snapshot.");
            return;
        }
        println!(
            "   {:20} │ {:>9} │ {:>9} │ {:>6}",
            "Department", "Capacity", "Demand", "Util"
        );
        println!("   ─────────────────────┼───────────┼───────────┼───────");
        for snap in snapshots {
            println!(
                "   {:20} │ {:>8.1}h │ {:>8.1}h │ {:>5.1}%",
                super::truncate(&snap.department, 20),
                snap.capacity_hours,
                snap.demand_hours,
                snap.utilization
            );
        }
    })
}
