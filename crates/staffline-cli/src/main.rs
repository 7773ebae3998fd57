//! Staffline CLI - Workforce capacity planning
//!
//! Usage:
//!   staffline init                  Initialize database
//!   staffline seed-demo             Load a demo organization
//!   staffline intelligence          Full capacity report
//!   staffline scenario --file F     Run a what-if scenario
//!   staffline serve --port 3000     Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let output = commands::Output::new(cli.json);

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::SeedDemo => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_seed_demo(&db, chrono::Local::now().date_naive())
        }
        Commands::Snapshot { date } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let date = commands::parse_date_arg("--date", date.as_deref())?;
            commands::cmd_snapshot(&db, date, output)
        }
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                cli.config.as_deref(),
                &host,
                port,
                no_auth,
                cli.no_encrypt,
                static_dir.as_deref(),
            )
            .await
        }
        Commands::Utilization { department } => {
            let engine = commands::open_engine(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_utilization(&engine, department.as_deref(), output).await
        }
        Commands::Intelligence { department, months } => {
            let engine = commands::open_engine(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_intelligence(&engine, department, months, output).await
        }
        Commands::Bottlenecks { severity } => {
            let engine = commands::open_engine(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_bottlenecks(&engine, severity.as_deref(), output).await
        }
        Commands::Patterns {
            months,
            granularity,
        } => {
            let engine = commands::open_engine(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_patterns(&engine, months, &granularity, output).await
        }
        Commands::Skills { horizon } => {
            let engine = commands::open_engine(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_skills(&engine, horizon, output).await
        }
        Commands::Predict { horizon, scenarios } => {
            let engine = commands::open_engine(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_predict(&engine, horizon, &scenarios, output).await
        }
        Commands::Scenario { file } => {
            let engine = commands::open_engine(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_scenario(&engine, &file, output).await
        }
        Commands::Optimize => {
            let engine = commands::open_engine(&cli.db, cli.config.as_deref(), cli.no_encrypt)?;
            commands::cmd_optimize(&engine, output).await
        }
    }
}
