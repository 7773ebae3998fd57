//! Allocation operations

use chrono::{Datelike, Weekday};
use rusqlite::params;

use super::{parse_date, parse_datetime, Database};
use crate::capacity::types::DateRange;
use crate::error::{Error, Result};
use crate::models::{Allocation, NewAllocation};

impl Database {
    /// Allocate an employee to a project for one week
    ///
    /// `week_start` must be a Monday.
    pub fn create_allocation(&self, allocation: &NewAllocation) -> Result<i64> {
        if allocation.week_start.weekday() != Weekday::Mon {
            return Err(Error::InvalidData(format!(
                "Allocations start on a Monday, {} is a {}",
                allocation.week_start,
                allocation.week_start.weekday()
            )));
        }
        if !allocation.allocated_hours.is_finite() || allocation.allocated_hours < 0.0 {
            return Err(Error::InvalidData(format!(
                "Allocated hours must be non-negative, got {}",
                allocation.allocated_hours
            )));
        }
        if self.get_employee(allocation.employee_id)?.is_none() {
            return Err(Error::NotFound(format!("Employee {}", allocation.employee_id)));
        }
        if self.get_project(allocation.project_id)?.is_none() {
            return Err(Error::NotFound(format!("Project {}", allocation.project_id)));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO allocations (employee_id, project_id, week_start, allocated_hours)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                allocation.employee_id,
                allocation.project_id,
                allocation.week_start.to_string(),
                allocation.allocated_hours
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List allocations, optionally within a range and for one employee
    pub fn list_allocations(
        &self,
        range: Option<DateRange>,
        employee_id: Option<i64>,
    ) -> Result<Vec<Allocation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, employee_id, project_id, week_start, allocated_hours, created_at
            FROM allocations
            WHERE (?1 IS NULL OR week_start >= ?1)
              AND (?2 IS NULL OR week_start <= ?2)
              AND (?3 IS NULL OR employee_id = ?3)
            ORDER BY week_start, employee_id, project_id
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![
                    range.map(|r| r.from.to_string()),
                    range.map(|r| r.to.to_string()),
                    employee_id
                ],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, employee_id, project_id, week, hours, created)| {
                Ok(Allocation {
                    id,
                    employee_id,
                    project_id,
                    week_start: parse_date(&week)?,
                    allocated_hours: hours,
                    created_at: parse_datetime(&created)?,
                })
            })
            .collect()
    }

    /// Delete an allocation; returns whether it existed
    pub fn delete_allocation(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM allocations WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }
}
