//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Setup commands (init, seed-demo, snapshot) and shared utilities (open_db)
//! - `reports` - Engine reports (utilization, intelligence, bottlenecks, ...)
//! - `scenario` - What-if scenario runs from a JSON file
//! - `serve` - Web server command

pub mod core;
pub mod reports;
pub mod scenario;
pub mod serve;

// Re-export command functions for main.rs
pub use core::*;
pub use reports::*;
pub use scenario::*;
pub use serve::*;

use anyhow::Result;
use serde::Serialize;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Where report output goes: a human table or raw JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as pretty JSON, or hand it to `human` for table output
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}
