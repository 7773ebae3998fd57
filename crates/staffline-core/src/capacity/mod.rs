//! Capacity & Resource Analytics Engine
//!
//! Turns allocation and utilization history into planning intelligence:
//!
//! - **Utilization** - current utilization overall, per department and per skill
//! - **Trends** - OLS trend estimation over equally spaced periods
//! - **Seasonality** - calendar-month peaks, lows and anomalies
//! - **Bottlenecks** - current, predicted and historical shortfalls
//! - **Scenarios** - deterministic what-if simulation
//! - **Skills** - supply vs demand forecasting with hiring and training actions
//! - **Optimization** - ranked allocation corrections with a phased plan
//!
//! ## Usage
//!
//! ```rust,ignore
//! use staffline_core::capacity::{CapacityEngine, IntelligenceFilters};
//!
//! let engine = CapacityEngine::new(db.clone(), EngineConfig::default());
//! let report = engine.get_capacity_intelligence(&IntelligenceFilters::default()).await?;
//! ```

pub mod bottlenecks;
pub mod engine;
pub mod gateway;
pub mod optimizer;
pub mod predictions;
pub mod recommendations;
pub mod scenario;
pub mod seasonality;
pub mod skills;
pub mod trend;
pub mod types;
pub mod utilization;

pub use engine::CapacityEngine;
pub use gateway::{
    AllocationFilter, BottleneckFilter, BottleneckRow, CapacityGateway, CapacitySnapshotRow,
    SkillDemandRow, SkillHistoryRow, SkillSupplyRow, WorkforceMember,
};
pub use types::*;
