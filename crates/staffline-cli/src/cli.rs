//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Staffline - Workforce capacity planning
#[derive(Parser)]
#[command(name = "staffline")]
#[command(about = "Capacity and resource analytics for workforce planning", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "staffline.db", global = true)]
    pub db: PathBuf,

    /// Engine config file (TOML)
    ///
    /// Falls back to STAFFLINE_CONFIG, then ~/.config/staffline/config.toml,
    /// then built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set STAFFLINE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Print reports as raw JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Fill the database with a demo organization and six months of history
    SeedDemo,

    /// Record a capacity snapshot for the week ending on a date
    Snapshot {
        /// Snapshot date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires a bearer key from STAFFLINE_API_KEYS.
        #[arg(long)]
        no_auth: bool,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Show current utilization overall, by department and by skill
    Utilization {
        /// Restrict to one department
        #[arg(short, long)]
        department: Option<String>,
    },

    /// Show the full capacity intelligence report
    Intelligence {
        /// Restrict utilization to one department
        #[arg(short, long)]
        department: Option<String>,

        /// Months of history for capacity trends
        #[arg(short, long)]
        months: Option<u32>,
    },

    /// Show current, predicted and historical bottlenecks
    Bottlenecks {
        /// Only bottlenecks at this severity: low, medium, high, critical
        #[arg(short, long)]
        severity: Option<String>,
    },

    /// Analyze seasonality, trend and anomalies in utilization history
    Patterns {
        /// Months of history to analyze
        #[arg(short, long, default_value = "12")]
        months: u32,

        /// Bucket size: weekly, monthly
        #[arg(short, long, default_value = "monthly")]
        granularity: String,
    },

    /// Forecast skill demand, gaps, hiring and training
    Skills {
        /// Months ahead
        #[arg(long)]
        horizon: Option<u32>,
    },

    /// Predict utilization under optimistic, realistic and pessimistic scenarios
    Predict {
        /// Months ahead
        #[arg(long)]
        horizon: Option<u32>,

        /// Scenario to include (repeatable; all three when omitted)
        #[arg(short, long = "scenario")]
        scenarios: Vec<String>,
    },

    /// Run a what-if scenario from a JSON file
    ///
    /// The file holds `{"changes": [...], "analysis_options": {...}}` or a
    /// bare array of changes.
    Scenario {
        /// Scenario JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Suggest corrections for the current week's allocations
    Optimize,
}
