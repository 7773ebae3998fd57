//! What-if scenario command

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use staffline_core::capacity::{ScenarioChange, ScenarioRequest};
use staffline_core::db::Database;
use staffline_core::CapacityEngine;

use super::reports::print_recommendations;
use super::{truncate, Output};

/// A scenario file holds a full request or just the list of changes
#[derive(Deserialize)]
#[serde(untagged)]
enum ScenarioFile {
    Request(ScenarioRequest),
    Changes(Vec<ScenarioChange>),
}

/// Read a scenario request from a JSON file
pub fn load_scenario(path: &Path) -> Result<ScenarioRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    let parsed: ScenarioFile = serde_json::from_str(&text)
        .with_context(|| format!("Invalid scenario JSON in {}", path.display()))?;

    let request = match parsed {
        ScenarioFile::Request(request) => request,
        ScenarioFile::Changes(changes) => ScenarioRequest {
            changes,
            ..Default::default()
        },
    };
    if request.changes.is_empty() {
        anyhow::bail!("Scenario file {} lists no changes", path.display());
    }
    Ok(request)
}

pub async fn cmd_scenario(
    engine: &CapacityEngine<Database>,
    file: &Path,
    output: Output,
) -> Result<()> {
    let request = load_scenario(file)?;
    let result = engine.run_scenario_analysis(&request).await?;

    output.emit(&result, |result| {
        let impact = &result.capacity_impact;
        println!();
        println!("🧪 Scenario {}", result.scenario_id);
        println!("   ─────────────────────────────────────────────────────");
        println!(
            "   Utilization: {:.1}% → {:.1}%",
            impact.baseline_utilization, impact.new_overall_utilization
        );
        println!(
            "   Demand {:+.1}h, capacity {:+.1}h",
            impact.total_demand_change, impact.total_capacity_change
        );

        if !impact.department_impacts.is_empty() {
            println!();
            println!(
                "   {:20} │ {:>8} │ {:>8}",
                "Department", "Before", "After"
            );
            println!("   ─────────────────────┼──────────┼──────────");
            for dept in &impact.department_impacts {
                println!(
                    "   {:20} │ {:>7.1}% │ {:>7.1}%",
                    truncate(&dept.department, 20),
                    dept.baseline_utilization,
                    dept.projected_utilization
                );
            }
        }

        let new_bottlenecks = &result.bottleneck_analysis.new_bottlenecks;
        if !new_bottlenecks.is_empty() {
            println!();
            println!("   🚧 {} new bottleneck(s) expected", new_bottlenecks.len());
            for b in new_bottlenecks {
                println!("      {} {} ({})", b.severity, b.affected_resource, b.bottleneck_type);
            }
        }

        println!();
        println!("   Risk: {}", result.risk_assessment.risk_level);
        for risk in &result.risk_assessment.risks {
            println!("      {}: {}", risk.name, risk.description);
        }

        print_recommendations(&result.recommendations);

        for warning in &result.warnings {
            println!("   ⚠️  {}", warning);
        }
    })
}
