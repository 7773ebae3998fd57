//! Report command implementations
//!
//! Each command runs one engine operation and prints it as a table, or as
//! JSON with `--json`.

use anyhow::Result;
use staffline_core::capacity::predictions::parse_scenarios;
use staffline_core::capacity::{
    Bottleneck, CapacityTrends, Granularity, IntelligenceFilters, PatternOptions, Prediction,
    PredictionOptions, Recommendation, Severity, UtilizationSnapshot,
};
use staffline_core::db::Database;
use staffline_core::CapacityEngine;

use super::{truncate, Output};

fn basis_note(fallback: bool) -> &'static str {
    if fallback {
        " (fallback, no data)"
    } else {
        ""
    }
}

fn print_utilization(snapshot: &UtilizationSnapshot) {
    println!();
    println!("📊 Utilization {}", snapshot.period);
    println!("   ─────────────────────────────────────────────────────");
    println!(
        "   Overall: {:.1}%{}",
        snapshot.overall,
        basis_note(snapshot.basis.is_fallback())
    );

    if !snapshot.by_department.is_empty() {
        println!();
        println!(
            "   {:20} │ {:>6} │ {:>9} │ {:>9}",
            "Department", "Util", "Committed", "Available"
        );
        println!("   ─────────────────────┼────────┼───────────┼───────────");
        for dept in &snapshot.by_department {
            println!(
                "   {:20} │ {:>5.1}% │ {:>8.1}h │ {:>8.1}h",
                truncate(&dept.department, 20),
                dept.utilization,
                dept.committed,
                dept.available
            );
        }
    }

    if !snapshot.by_skill.is_empty() {
        println!();
        println!("   {:20} │ {:>6} │ {:>9}", "Skill", "Util", "Available");
        println!("   ─────────────────────┼────────┼───────────");
        for skill in &snapshot.by_skill {
            println!(
                "   {:20} │ {:>5.1}% │ {:>9}",
                truncate(&skill.skill, 20),
                skill.utilization,
                skill.available_resources
            );
        }
    }
}

fn print_trends(trends: &CapacityTrends) {
    println!();
    println!(
        "📈 Capacity trends ({} periods){}",
        trends.points.len(),
        basis_note(trends.basis.is_fallback())
    );
    println!("   ─────────────────────────────────────────────────────");
    for point in &trends.points {
        println!(
            "   {:10} {:>5.1}%  capacity {:>8.1}h  demand {:>8.1}h",
            point.period, point.utilization, point.capacity, point.demand
        );
    }
    println!(
        "   Utilization {} ({:+.2}/period, R² {:.2})",
        trends.utilization_trend.direction,
        trends.utilization_trend.slope,
        trends.utilization_trend.r_squared
    );
    println!("   Demand {}", trends.demand_trend.direction);
}

fn print_bottleneck_list(label: &str, bottlenecks: &[Bottleneck]) {
    println!();
    println!("   {} ({})", label, bottlenecks.len());
    for b in bottlenecks {
        println!(
            "   {:>8}  {:10} {:25} impact {:>5.1}  ~{}d",
            b.severity.as_str(),
            b.bottleneck_type.as_str(),
            truncate(&b.affected_resource, 25),
            b.impact,
            b.estimated_duration
        );
        for action in &b.recommended_actions {
            println!("             → {}", action);
        }
    }
}

fn print_predictions(predictions: &[Prediction]) {
    println!();
    println!("🔮 Utilization predictions");
    println!("   ─────────────────────────────────────────────────────");
    for prediction in predictions {
        let path = prediction
            .points
            .iter()
            .map(|p| format!("{} {:.1}%", p.period, p.utilization))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "   {:12} → {:>5.1}% in {} months (confidence {:.0}%){}",
            prediction.scenario.as_str(),
            prediction.predicted_utilization,
            prediction.horizon_months,
            prediction.confidence,
            basis_note(prediction.basis.is_fallback())
        );
        if !path.is_empty() {
            println!("                {}", path);
        }
    }
}

pub(crate) fn print_recommendations(recommendations: &[Recommendation]) {
    if recommendations.is_empty() {
        return;
    }
    println!();
    println!("💡 Recommendations");
    println!("   ─────────────────────────────────────────────────────");
    for rec in recommendations {
        println!("   [{}] {}", rec.priority, rec.title);
        println!("       {}", rec.description);
    }
}

pub async fn cmd_utilization(
    engine: &CapacityEngine<Database>,
    department: Option<&str>,
    output: Output,
) -> Result<()> {
    let snapshot = engine.current_utilization(department, None).await?;
    output.emit(&snapshot, print_utilization)
}

pub async fn cmd_intelligence(
    engine: &CapacityEngine<Database>,
    department: Option<String>,
    months: Option<u32>,
    output: Output,
) -> Result<()> {
    let filters = IntelligenceFilters {
        department,
        timeframe_months: months,
    };
    let report = engine.get_capacity_intelligence(&filters).await?;

    output.emit(&report, |report| {
        print_utilization(&report.current_utilization);
        print_trends(&report.capacity_trends);

        println!();
        println!("🚧 Bottlenecks");
        println!("   ─────────────────────────────────────────────────────");
        print_bottleneck_list("Current", &report.bottleneck_analysis.current);
        print_bottleneck_list("Predicted", &report.bottleneck_analysis.predicted);

        print_predictions(&report.predictions);

        if !report.risk_factors.is_empty() {
            println!();
            println!("⚠️  Risk factors");
            println!("   ─────────────────────────────────────────────────────");
            for risk in &report.risk_factors {
                println!("   [{}] {}: {}", risk.level, risk.name, risk.description);
            }
        }

        print_recommendations(&report.recommendations);

        if !report.degraded_sections.is_empty() {
            println!();
            println!(
                "⚠️  Fallback data used for: {}",
                report.degraded_sections.join(", ")
            );
        }
    })
}

pub async fn cmd_bottlenecks(
    engine: &CapacityEngine<Database>,
    severity: Option<&str>,
    output: Output,
) -> Result<()> {
    let severity: Option<Severity> = severity
        .map(str::parse::<Severity>)
        .transpose()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let report = engine.identify_bottlenecks(severity).await?;

    output.emit(&report, |report| {
        println!();
        println!("🚧 Bottlenecks{}", basis_note(report.basis.is_fallback()));
        println!("   ─────────────────────────────────────────────────────");
        print_bottleneck_list("Current", &report.current);
        print_bottleneck_list("Predicted", &report.predicted);
        print_bottleneck_list("Resolved recently", &report.historical);
    })
}

pub async fn cmd_patterns(
    engine: &CapacityEngine<Database>,
    months: u32,
    granularity: &str,
    output: Output,
) -> Result<()> {
    if months == 0 {
        anyhow::bail!("--months must be at least 1");
    }
    let granularity: Granularity = granularity
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let options = PatternOptions {
        period_months: months,
        granularity,
    };
    let patterns = engine.analyze_utilization_patterns(&options).await?;

    output.emit(&patterns, |patterns| {
        println!();
        println!(
            "🗓️  Utilization patterns ({}, last {} months)",
            granularity.as_str(),
            months
        );
        println!("   ─────────────────────────────────────────────────────");
        if patterns.patterns.is_empty() {
            println!("   No snapshots recorded. Run 'staffline snapshot' regularly.");
            return;
        }
        for point in &patterns.patterns {
            println!("   {:10} {:>5.1}%", point.period, point.utilization);
        }
        println!();
        println!(
            "   Trend: {} ({:+.2}/period)",
            patterns.trends.direction, patterns.trends.slope
        );
        let season = &patterns.seasonality;
        if season.present {
            println!(
                "   Seasonal: peaks in months {:?}, lows in {:?}",
                season.peak_months, season.low_months
            );
        } else {
            println!("   Seasonal: none detected");
        }
        for anomaly in &patterns.anomalies {
            println!(
                "   ❗ {} at {:.1}% (expected {:.1}%)",
                anomaly.period, anomaly.actual_utilization, anomaly.expected_utilization
            );
        }
    })
}

pub async fn cmd_skills(
    engine: &CapacityEngine<Database>,
    horizon: Option<u32>,
    output: Output,
) -> Result<()> {
    let horizon = horizon.unwrap_or(engine.config().prediction_horizon);
    if horizon == 0 {
        anyhow::bail!("--horizon must be at least 1");
    }
    let report = engine.forecast_skill_demand(horizon).await?;

    output.emit(&report, |report| {
        println!();
        println!("🧠 Skill demand, {} months ahead", report.horizon_months);
        println!("   ─────────────────────────────────────────────────────");
        println!(
            "   {:20} │ {:>6} │ {:>6} │ {:>4} │ {:10}",
            "Skill", "Supply", "Demand", "Gap", "Trend"
        );
        println!("   ─────────────────────┼────────┼────────┼──────┼───────────");
        for skill in &report.skill_demand {
            println!(
                "   {:20} │ {:>6} │ {:>6} │ {:>4} │ {:10}",
                truncate(&skill.skill, 20),
                skill.current_supply,
                skill.forecasted_demand,
                skill.gap,
                skill.trend_direction.as_str()
            );
        }

        if !report.hiring_recommendations.is_empty() {
            println!();
            println!("   Hiring");
            for hire in &report.hiring_recommendations {
                println!(
                    "   [{}] {} x {} (~{} weeks): {}",
                    hire.urgency, hire.positions, hire.skill, hire.time_to_fill, hire.rationale
                );
            }
        }
        if !report.training_recommendations.is_empty() {
            println!();
            println!("   Training");
            for training in &report.training_recommendations {
                let names = training
                    .candidates
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "   {} (~{} trainees): {}",
                    training.skill, training.estimated_trainees, names
                );
            }
        }
    })
}

pub async fn cmd_predict(
    engine: &CapacityEngine<Database>,
    horizon: Option<u32>,
    scenarios: &[String],
    output: Output,
) -> Result<()> {
    let horizon = horizon.unwrap_or(engine.config().prediction_horizon);
    if horizon == 0 {
        anyhow::bail!("--horizon must be at least 1");
    }
    let options = PredictionOptions {
        horizon,
        scenarios: parse_scenarios(scenarios)?,
    };
    let predictions = engine.get_capacity_predictions(&options).await?;
    output.emit(&predictions, |predictions| print_predictions(predictions))
}

pub async fn cmd_optimize(engine: &CapacityEngine<Database>, output: Output) -> Result<()> {
    let result = engine.optimize_allocation(None).await?;

    output.emit(&result, |result| {
        println!();
        println!("🛠️  Allocation optimization");
        println!("   ─────────────────────────────────────────────────────");
        if result.suggestions.is_empty() {
            println!("   ✅ No corrections suggested.");
            return;
        }
        for phase in &result.implementation {
            println!();
            println!(
                "   Phase {}: {} ({}, {})",
                phase.phase, phase.name, phase.risk_level, phase.duration
            );
            for s in &phase.suggestions {
                let adjustment = s
                    .adjustment
                    .map(|h| format!(" {:+.1}h", h))
                    .unwrap_or_default();
                println!(
                    "   • employee {} / project {}{}: {}",
                    s.employee_id, s.project_id, adjustment, s.reason
                );
            }
        }
        println!();
        println!(
            "   Expected improvement: {:.1} points, overall risk {}",
            result.expected_improvement, result.risk_assessment.overall_risk
        );
    })
}
