//! Engine configuration
//!
//! Tunables for the capacity engine. Loaded from a TOML file; every field is
//! optional in the file and falls back to the built-in default.
//!
//! Resolution order:
//! 1. Explicit path (`--config`)
//! 2. `STAFFLINE_CONFIG` environment variable
//! 3. `<config_dir>/staffline/config.toml` (if it exists)
//! 4. Built-in defaults
//!
//! ```toml
//! fallback_utilization = 75.0
//! assumed_capacity_pool = 2000.0
//! trend_lookback_months = 6
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Environment variable naming an engine config file
pub const CONFIG_ENV: &str = "STAFFLINE_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Overall utilization reported when no allocation rows exist (percent)
    pub fallback_utilization: f64,
    /// Baseline capacity pool the scenario simulator assumes (hours)
    pub assumed_capacity_pool: f64,
    /// Hours per person per unit of duration
    pub hours_per_person_unit: f64,
    /// Default trailing window for "current" utilization (days)
    pub current_window_days: i64,
    /// Longest window a caller may ask utilization for (days)
    pub max_window_days: i64,
    /// Months of snapshot history used for capacity trends
    pub trend_lookback_months: u32,
    /// Default prediction horizon (months)
    pub prediction_horizon: u32,
    /// Longest horizon accepted for predictions and skill forecasts (months)
    pub max_prediction_horizon: u32,
    /// How far back resolved bottlenecks count as history (months)
    pub historical_bottleneck_months: u32,
    /// Maximum number of historical bottlenecks returned
    pub historical_bottleneck_limit: usize,
    /// Maximum number of optimization suggestions returned
    pub max_suggestions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_utilization: 75.0,
            assumed_capacity_pool: 2000.0,
            hours_per_person_unit: 160.0,
            current_window_days: 7,
            max_window_days: 366,
            trend_lookback_months: 6,
            prediction_horizon: 3,
            max_prediction_horizon: 24,
            historical_bottleneck_months: 6,
            historical_bottleneck_limit: 10,
            max_suggestions: 10,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from an explicit path
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Resolve the config using the documented lookup order
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(path) = std::env::var(CONFIG_ENV).ok().filter(|s| !s.is_empty()) {
            return Self::from_file(Path::new(&path));
        }

        if let Some(path) = default_config_path().filter(|p| p.exists()) {
            return Self::from_file(&path);
        }

        debug!("No engine config file found, using defaults");
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.fallback_utilization) {
            return Err(Error::Config(format!(
                "fallback_utilization must be within 0-100, got {}",
                self.fallback_utilization
            )));
        }
        if self.assumed_capacity_pool <= 0.0 {
            return Err(Error::Config(
                "assumed_capacity_pool must be positive".to_string(),
            ));
        }
        if self.hours_per_person_unit <= 0.0 {
            return Err(Error::Config(
                "hours_per_person_unit must be positive".to_string(),
            ));
        }
        if !(1..=self.max_window_days).contains(&self.current_window_days) {
            return Err(Error::Config(format!(
                "current_window_days must be within 1-{}",
                self.max_window_days
            )));
        }
        if !(1..=self.max_prediction_horizon).contains(&self.prediction_horizon) {
            return Err(Error::Config(format!(
                "prediction_horizon must be within 1-{}",
                self.max_prediction_horizon
            )));
        }
        Ok(())
    }
}

/// Default config location (`~/.config/staffline/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("staffline").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = EngineConfig::from_toml_str("fallback_utilization = 60.0").unwrap();
        assert_eq!(config.fallback_utilization, 60.0);
        assert_eq!(config.assumed_capacity_pool, 2000.0);
        assert_eq!(config.max_suggestions, 10);
    }

    #[test]
    fn test_rejects_out_of_range_fallback() {
        let result = EngineConfig::from_toml_str("fallback_utilization = 140.0");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_default_horizon_beyond_limit() {
        let result = EngineConfig::from_toml_str("prediction_horizon = 36");
        assert!(matches!(result, Err(Error::Config(_))));

        let config =
            EngineConfig::from_toml_str("prediction_horizon = 36\nmax_prediction_horizon = 48")
                .unwrap();
        assert_eq!(config.prediction_horizon, 36);
    }

    #[test]
    fn test_rejects_unparseable_toml() {
        let result = EngineConfig::from_toml_str("fallback_utilization = \"high\"");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "trend_lookback_months = 12").unwrap();
        writeln!(file, "max_suggestions = 5").unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.trend_lookback_months, 12);
        assert_eq!(config.max_suggestions, 5);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let result = EngineConfig::load(Some(Path::new("/nonexistent/staffline.toml")));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
