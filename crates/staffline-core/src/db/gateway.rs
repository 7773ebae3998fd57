//! `CapacityGateway` over the SQLite store
//!
//! rusqlite is blocking, so each fetch runs on the blocking pool with its own
//! clone of the (cheaply cloneable) pooled handle.

use async_trait::async_trait;

use super::Database;
use crate::capacity::gateway::{
    AllocationFilter, BottleneckFilter, BottleneckRow, CapacityGateway, CapacitySnapshotRow,
    SkillDemandRow, SkillHistoryRow, SkillSupplyRow, WorkforceMember,
};
use crate::capacity::types::{AllocationRecord, DateRange, Granularity};
use crate::error::Result;

impl Database {
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Database) -> Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(db)).await?
    }
}

#[async_trait]
impl CapacityGateway for Database {
    async fn fetch_capacity_snapshots(
        &self,
        range: DateRange,
        granularity: Granularity,
    ) -> Result<Vec<CapacitySnapshotRow>> {
        self.blocking(move |db| db.query_capacity_snapshots(range, granularity))
            .await
    }

    async fn fetch_bottlenecks(&self, filter: &BottleneckFilter) -> Result<Vec<BottleneckRow>> {
        let filter = filter.clone();
        self.blocking(move |db| db.query_bottlenecks(&filter)).await
    }

    async fn fetch_skill_supply(&self) -> Result<Vec<SkillSupplyRow>> {
        self.blocking(|db| db.query_skill_supply()).await
    }

    async fn fetch_skill_demand(&self) -> Result<Vec<SkillDemandRow>> {
        self.blocking(|db| db.query_skill_demand()).await
    }

    async fn fetch_allocation_records(
        &self,
        range: DateRange,
        filter: &AllocationFilter,
    ) -> Result<Vec<AllocationRecord>> {
        let filter = filter.clone();
        self.blocking(move |db| db.query_allocation_records(range, &filter))
            .await
    }

    async fn fetch_workforce(
        &self,
        range: DateRange,
        filter: &AllocationFilter,
    ) -> Result<Vec<WorkforceMember>> {
        let filter = filter.clone();
        self.blocking(move |db| db.query_workforce(range, &filter))
            .await
    }

    async fn fetch_skill_history(&self, range: DateRange) -> Result<Vec<SkillHistoryRow>> {
        self.blocking(move |db| db.query_skill_history(range)).await
    }
}
