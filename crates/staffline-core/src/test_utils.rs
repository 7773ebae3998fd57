//! Test utilities for staffline-core
//!
//! `FakeGateway` is an in-memory `CapacityGateway` with configurable rows and
//! per-query failure injection, so engine behavior can be exercised without a
//! database.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::capacity::gateway::{
    AllocationFilter, BottleneckFilter, BottleneckRow, CapacityGateway, CapacitySnapshotRow,
    SkillDemandRow, SkillHistoryRow, SkillSupplyRow, WorkforceMember,
};
use crate::capacity::types::{AllocationRecord, BottleneckStatus, DateRange, Granularity, Severity};
use crate::error::{Error, Result};
use crate::models::{EmployeeSkill, ProficiencyLevel, SkillCategory};

/// Gateway queries that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayQuery {
    CapacitySnapshots,
    Bottlenecks,
    SkillSupply,
    SkillDemand,
    AllocationRecords,
    Workforce,
    SkillHistory,
}

/// In-memory gateway backed by plain vectors
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    pub snapshots: Vec<CapacitySnapshotRow>,
    pub bottlenecks: Vec<BottleneckRow>,
    pub skill_supply: Vec<SkillSupplyRow>,
    pub skill_demand: Vec<SkillDemandRow>,
    pub allocations: Vec<AllocationRecord>,
    pub workforce: Vec<WorkforceMember>,
    pub skill_history: Vec<SkillHistoryRow>,
    failing: HashSet<GatewayQuery>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `query` return a gateway error
    pub fn failing(mut self, query: GatewayQuery) -> Self {
        self.failing.insert(query);
        self
    }

    fn check(&self, query: GatewayQuery) -> Result<()> {
        if self.failing.contains(&query) {
            Err(Error::Gateway(format!("{:?} query failed", query)))
        } else {
            Ok(())
        }
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[async_trait]
impl CapacityGateway for FakeGateway {
    async fn fetch_capacity_snapshots(
        &self,
        range: DateRange,
        _granularity: Granularity,
    ) -> Result<Vec<CapacitySnapshotRow>> {
        self.check(GatewayQuery::CapacitySnapshots)?;
        let from = month_start(range.from);
        Ok(self
            .snapshots
            .iter()
            .filter(|s| s.bucket_start >= from && s.bucket_start <= range.to)
            .cloned()
            .collect())
    }

    async fn fetch_bottlenecks(&self, filter: &BottleneckFilter) -> Result<Vec<BottleneckRow>> {
        self.check(GatewayQuery::Bottlenecks)?;
        Ok(self
            .bottlenecks
            .iter()
            .filter(|b| filter.status.map_or(true, |s| b.status == s))
            .filter(|b| filter.severity.map_or(true, |s| Severity::from_impact(b.impact) == s))
            .filter(|b| match filter.since {
                None => true,
                Some(since) if b.status == BottleneckStatus::Resolved => {
                    b.resolved_at.is_some_and(|at| at.date_naive() >= since)
                }
                Some(since) => b.identified_at.date_naive() >= since,
            })
            .cloned()
            .collect())
    }

    async fn fetch_skill_supply(&self) -> Result<Vec<SkillSupplyRow>> {
        self.check(GatewayQuery::SkillSupply)?;
        Ok(self.skill_supply.clone())
    }

    async fn fetch_skill_demand(&self) -> Result<Vec<SkillDemandRow>> {
        self.check(GatewayQuery::SkillDemand)?;
        Ok(self.skill_demand.clone())
    }

    async fn fetch_allocation_records(
        &self,
        _range: DateRange,
        filter: &AllocationFilter,
    ) -> Result<Vec<AllocationRecord>> {
        self.check(GatewayQuery::AllocationRecords)?;
        Ok(self
            .allocations
            .iter()
            .filter(|a| match &filter.department {
                Some(d) => a.department.as_deref() == Some(d.as_str()),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn fetch_workforce(
        &self,
        _range: DateRange,
        filter: &AllocationFilter,
    ) -> Result<Vec<WorkforceMember>> {
        self.check(GatewayQuery::Workforce)?;
        Ok(self
            .workforce
            .iter()
            .filter(|m| match &filter.department {
                Some(d) => m.department.eq_ignore_ascii_case(d),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn fetch_skill_history(&self, _range: DateRange) -> Result<Vec<SkillHistoryRow>> {
        self.check(GatewayQuery::SkillHistory)?;
        Ok(self.skill_history.clone())
    }
}

/// Monthly snapshot rows starting at `first_month`, one per value
pub fn monthly_snapshots(first_month: NaiveDate, values: &[f64]) -> Vec<CapacitySnapshotRow> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, value)| {
            let bucket_start = month_start(first_month)
                .checked_add_months(chrono::Months::new(i as u32))?;
            Some(CapacitySnapshotRow {
                period: bucket_start.format("%Y-%m").to_string(),
                bucket_start,
                avg_utilization: *value,
                avg_capacity: 1600.0,
                avg_demand: 16.0 * value,
            })
        })
        .collect()
}

/// Workforce member with technical skills at the given levels
pub fn workforce_member(
    employee_id: i64,
    department: &str,
    allocated_hours: f64,
    skills: &[(&str, ProficiencyLevel)],
) -> WorkforceMember {
    WorkforceMember {
        employee_id,
        name: format!("Employee {}", employee_id),
        department: department.to_string(),
        default_hours: 40.0,
        allocated_hours,
        skills: skills
            .iter()
            .map(|(skill, level)| EmployeeSkill {
                skill: skill.to_string(),
                category: SkillCategory::Technical,
                level: *level,
            })
            .collect(),
    }
}
