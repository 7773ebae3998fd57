//! Capacity snapshots
//!
//! A snapshot stores, per department, the capacity and allocated demand of the
//! week ending on the snapshot date. The capacity engine reads them back as a
//! bucketed time series.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use rusqlite::params;
use tracing::info;

use super::{parse_date, Database};
use crate::capacity::gateway::CapacitySnapshotRow;
use crate::capacity::types::{DateRange, Granularity};
use crate::capacity::utilization::utilization_percent;
use crate::error::Result;

/// One stored department snapshot
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DepartmentSnapshot {
    pub snapshot_date: NaiveDate,
    pub department: String,
    pub utilization: f64,
    pub capacity_hours: f64,
    pub demand_hours: f64,
}

fn bucket_of(date: NaiveDate, granularity: Granularity) -> (NaiveDate, String) {
    match granularity {
        Granularity::Monthly => {
            let start = date.with_day(1).unwrap_or(date);
            (start, start.format("%Y-%m").to_string())
        }
        Granularity::Weekly => {
            let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            let week = date.iso_week();
            (start, format!("{}-W{:02}", week.year(), week.week()))
        }
    }
}

impl Database {
    /// Aggregate the week ending on `date` per department and store it
    ///
    /// Re-running for the same date replaces that date's rows. Returns the
    /// snapshots written.
    pub fn record_capacity_snapshot(&self, date: NaiveDate) -> Result<Vec<DepartmentSnapshot>> {
        let range = DateRange::trailing_days(date, 7);
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let totals = {
            let mut stmt = tx.prepare(
                r#"
                SELECT e.department,
                       SUM(e.default_hours),
                       COALESCE(SUM(a.hours), 0)
                FROM employees e
                LEFT JOIN (
                    SELECT employee_id, SUM(allocated_hours) AS hours
                    FROM allocations
                    WHERE week_start BETWEEN ?1 AND ?2
                    GROUP BY employee_id
                ) a ON a.employee_id = e.id
                WHERE e.status = 'active'
                GROUP BY e.department
                ORDER BY e.department
                "#,
            )?;
            let rows = stmt
                .query_map(params![range.from.to_string(), range.to.to_string()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let snapshots: Vec<DepartmentSnapshot> = totals
            .into_iter()
            .map(|(department, capacity, demand)| DepartmentSnapshot {
                snapshot_date: date,
                utilization: utilization_percent(demand, capacity),
                department,
                capacity_hours: capacity,
                demand_hours: demand,
            })
            .collect();

        tx.execute(
            "DELETE FROM capacity_snapshots WHERE snapshot_date = ?",
            params![date.to_string()],
        )?;
        for snap in &snapshots {
            tx.execute(
                r#"
                INSERT INTO capacity_snapshots
                    (snapshot_date, department, utilization, capacity_hours, demand_hours)
                VALUES (?, ?, ?, ?, ?)
                "#,
                params![
                    date.to_string(),
                    snap.department,
                    snap.utilization,
                    snap.capacity_hours,
                    snap.demand_hours
                ],
            )?;
        }
        tx.commit()?;

        info!(date = %date, departments = snapshots.len(), "Recorded capacity snapshot");
        Ok(snapshots)
    }

    /// Organization-wide snapshots within `range`, averaged per bucket
    ///
    /// Each snapshot date is first summed across departments, then dates are
    /// averaged within their calendar bucket. Chronological.
    pub fn query_capacity_snapshots(
        &self,
        range: DateRange,
        granularity: Granularity,
    ) -> Result<Vec<CapacitySnapshotRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT snapshot_date, SUM(capacity_hours), SUM(demand_hours)
            FROM capacity_snapshots
            WHERE snapshot_date BETWEEN ? AND ?
            GROUP BY snapshot_date
            ORDER BY snapshot_date
            "#,
        )?;

        let per_date = stmt
            .query_map(params![range.from.to_string(), range.to.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // bucket start -> (label, utilization sum, capacity sum, demand sum, count)
        let mut buckets: BTreeMap<NaiveDate, (String, f64, f64, f64, usize)> = BTreeMap::new();
        for (date, capacity, demand) in per_date {
            let (start, label) = bucket_of(parse_date(&date)?, granularity);
            let entry = buckets.entry(start).or_insert((label, 0.0, 0.0, 0.0, 0));
            entry.1 += utilization_percent(demand, capacity);
            entry.2 += capacity;
            entry.3 += demand;
            entry.4 += 1;
        }

        Ok(buckets
            .into_iter()
            .map(|(bucket_start, (period, util, capacity, demand, count))| {
                let n = count as f64;
                CapacitySnapshotRow {
                    period,
                    bucket_start,
                    avg_utilization: util / n,
                    avg_capacity: capacity / n,
                    avg_demand: demand / n,
                }
            })
            .collect())
    }
}
