//! Data access contract consumed by the capacity engine
//!
//! The engine never touches storage rows directly. Everything it reads comes
//! through `CapacityGateway` as the typed records below, so analyzers can be
//! tested against an in-memory fake and the SQLite store can change shape
//! without touching the analytics.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{EmployeeSkill, SkillCategory};

use super::types::{
    AllocationRecord, BottleneckStatus, BottleneckType, DateRange, Granularity, Severity,
};

/// Aggregated capacity snapshot for one calendar bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitySnapshotRow {
    /// Bucket label ("2026-03" or "2026-W11")
    pub period: String,
    /// First day of the bucket
    pub bucket_start: NaiveDate,
    pub avg_utilization: f64,
    pub avg_capacity: f64,
    pub avg_demand: f64,
}

/// Stored bottleneck as returned by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckRow {
    pub id: i64,
    pub bottleneck_type: BottleneckType,
    pub affected_resource: String,
    pub impact: f64,
    pub affected_projects: Vec<i64>,
    pub estimated_duration_days: i64,
    pub root_causes: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub status: BottleneckStatus,
    pub identified_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Filter for bottleneck queries; `None` fields do not constrain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BottleneckFilter {
    pub status: Option<BottleneckStatus>,
    pub severity: Option<Severity>,
    /// Identified (active) or resolved (resolved) on or after this date
    pub since: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSupplyRow {
    pub skill: String,
    pub category: SkillCategory,
    /// Active employees holding the skill
    pub current_supply: u32,
    /// Mean proficiency score (1-4)
    pub avg_proficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDemandRow {
    pub skill: String,
    pub projects_requiring: u32,
    /// Sum of requested headcount across planning/active projects
    pub total_demand: u32,
}

/// Monthly allocation count for one skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillHistoryRow {
    pub skill: String,
    /// "YYYY-MM"
    pub period: String,
    pub allocation_count: u32,
}

/// An active employee with the hours allocated to them in a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkforceMember {
    pub employee_id: i64,
    pub name: String,
    pub department: String,
    /// Contracted hours per week
    pub default_hours: f64,
    /// Total hours allocated within the queried range
    pub allocated_hours: f64,
    pub skills: Vec<EmployeeSkill>,
}

impl WorkforceMember {
    /// Capacity for a window of `weeks` weeks
    pub fn capacity_for(&self, weeks: f64) -> f64 {
        self.default_hours * weeks
    }

    /// Allocated share of capacity (0 when there is no capacity)
    pub fn utilization_ratio(&self, weeks: f64) -> f64 {
        let capacity = self.capacity_for(weeks);
        if capacity > 0.0 {
            self.allocated_hours / capacity
        } else {
            0.0
        }
    }

    pub fn level_in(&self, skill: &str) -> Option<crate::models::ProficiencyLevel> {
        self.skills
            .iter()
            .find(|s| s.skill.eq_ignore_ascii_case(skill))
            .map(|s| s.level)
    }
}

/// Filter for allocation and workforce queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationFilter {
    pub department: Option<String>,
}

impl AllocationFilter {
    pub fn department(department: Option<&str>) -> Self {
        Self {
            department: department.map(|d| d.to_string()),
        }
    }
}

/// Read-only data source for the capacity engine
#[async_trait]
pub trait CapacityGateway: Send + Sync {
    /// Capacity snapshots averaged per calendar bucket, chronological
    async fn fetch_capacity_snapshots(
        &self,
        range: DateRange,
        granularity: Granularity,
    ) -> Result<Vec<CapacitySnapshotRow>>;

    /// Stored bottlenecks matching the filter
    async fn fetch_bottlenecks(&self, filter: &BottleneckFilter) -> Result<Vec<BottleneckRow>>;

    /// Supply per skill among active employees
    async fn fetch_skill_supply(&self) -> Result<Vec<SkillSupplyRow>>;

    /// Demand per skill from planning/active projects
    async fn fetch_skill_demand(&self) -> Result<Vec<SkillDemandRow>>;

    /// Allocation rows (per employee and project) within the range
    async fn fetch_allocation_records(
        &self,
        range: DateRange,
        filter: &AllocationFilter,
    ) -> Result<Vec<AllocationRecord>>;

    /// Active employees with their allocated hours within the range
    async fn fetch_workforce(
        &self,
        range: DateRange,
        filter: &AllocationFilter,
    ) -> Result<Vec<WorkforceMember>>;

    /// Monthly allocation counts per skill within the range
    async fn fetch_skill_history(&self, range: DateRange) -> Result<Vec<SkillHistoryRow>>;
}
