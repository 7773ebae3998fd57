//! Staffline Core Library
//!
//! Shared functionality for the Staffline capacity planning tool:
//! - Database access and migrations (employees, projects, allocations, snapshots)
//! - Capacity engine: utilization, trends, bottlenecks, scenarios, skill
//!   forecasts, allocation optimization and predictions
//! - Engine configuration loaded from TOML

pub mod capacity;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

/// Test utilities including an in-memory capacity gateway
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use capacity::{CapacityEngine, CapacityGateway};
pub use config::EngineConfig;
pub use db::{AuditEntry, AuditFilter, Database, DepartmentSnapshot};
pub use error::{Error, Result};
