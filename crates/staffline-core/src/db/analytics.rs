//! Aggregate queries behind the capacity gateway
//!
//! Every query returns typed gateway records; nothing above this layer sees a
//! SQL row.

use std::collections::HashMap;

use rusqlite::params;

use super::Database;
use crate::capacity::gateway::{
    AllocationFilter, SkillDemandRow, SkillHistoryRow, SkillSupplyRow, WorkforceMember,
};
use crate::capacity::types::{AllocationRecord, DateRange};
use crate::error::{Error, Result};
use crate::models::EmployeeSkill;

const LEVEL_SCORE_SQL: &str = "CASE es.level \
    WHEN 'beginner' THEN 1 WHEN 'intermediate' THEN 2 \
    WHEN 'advanced' THEN 3 WHEN 'expert' THEN 4 END";

impl Database {
    /// Active holders and mean proficiency per skill, including unheld skills
    pub fn query_skill_supply(&self) -> Result<Vec<SkillSupplyRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT s.name, s.category, COUNT(e.id),
                   COALESCE(AVG(CASE WHEN e.id IS NOT NULL THEN {} END), 0)
            FROM skills s
            LEFT JOIN employee_skills es ON es.skill_id = s.id
            LEFT JOIN employees e ON e.id = es.employee_id AND e.status = 'active'
            GROUP BY s.id
            ORDER BY s.name
            "#,
            LEVEL_SCORE_SQL
        ))?;

        let rows = stmt
            .query_map([], |row| {
                let category: String = row.get(1)?;
                Ok(SkillSupplyRow {
                    skill: row.get(0)?,
                    category: category.parse().unwrap_or_default(),
                    current_supply: row.get(2)?,
                    avg_proficiency: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Requested headcount per skill across planning and active projects
    pub fn query_skill_demand(&self) -> Result<Vec<SkillDemandRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.name, COUNT(DISTINCT p.id), SUM(r.quantity)
            FROM project_skill_requirements r
            JOIN projects p ON p.id = r.project_id
            JOIN skills s ON s.id = r.skill_id
            WHERE p.status IN ('planning', 'active')
            GROUP BY s.id
            ORDER BY s.name
            "#,
        )?;

        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(skill, projects_requiring, total)| {
                let total_demand = u32::try_from(total).map_err(|_| {
                    Error::InvalidData(format!("Demand for '{}' out of range: {}", skill, total))
                })?;
                Ok(SkillDemandRow {
                    skill,
                    projects_requiring,
                    total_demand,
                })
            })
            .collect()
    }

    /// Allocations per skill per month among current skill holders
    pub fn query_skill_history(&self, range: DateRange) -> Result<Vec<SkillHistoryRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.name, strftime('%Y-%m', a.week_start) AS period, COUNT(*)
            FROM allocations a
            JOIN employee_skills es ON es.employee_id = a.employee_id
            JOIN skills s ON s.id = es.skill_id
            WHERE a.week_start BETWEEN ? AND ?
            GROUP BY s.id, period
            ORDER BY period, s.name
            "#,
        )?;

        let rows = stmt
            .query_map(params![range.from.to_string(), range.to.to_string()], |row| {
                Ok(SkillHistoryRow {
                    skill: row.get(0)?,
                    period: row.get(1)?,
                    allocation_count: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Skills of every employee, keyed by employee id
    fn employee_skill_map(&self) -> Result<HashMap<i64, Vec<EmployeeSkill>>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT es.employee_id, s.name, s.category, es.level
            FROM employee_skills es
            JOIN skills s ON s.id = es.skill_id
            ORDER BY es.employee_id, s.name
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut map: HashMap<i64, Vec<EmployeeSkill>> = HashMap::new();
        for (employee_id, skill, category, level) in rows {
            if let Ok(level) = level.parse() {
                map.entry(employee_id).or_default().push(EmployeeSkill {
                    skill,
                    category: category.parse().unwrap_or_default(),
                    level,
                });
            }
        }
        Ok(map)
    }

    /// Active employees with the hours allocated to them within `range`
    pub fn query_workforce(
        &self,
        range: DateRange,
        filter: &AllocationFilter,
    ) -> Result<Vec<WorkforceMember>> {
        let mut skills = self.employee_skill_map()?;

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT e.id, e.name, e.department, e.default_hours, COALESCE(a.hours, 0)
            FROM employees e
            LEFT JOIN (
                SELECT employee_id, SUM(allocated_hours) AS hours
                FROM allocations
                WHERE week_start BETWEEN ?1 AND ?2
                GROUP BY employee_id
            ) a ON a.employee_id = e.id
            WHERE e.status = 'active'
              AND (?3 IS NULL OR e.department = ?3 COLLATE NOCASE)
            ORDER BY e.id
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![
                    range.from.to_string(),
                    range.to.to_string(),
                    filter.department
                ],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, f64>(4)?,
                    ))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(employee_id, name, department, default_hours, allocated_hours)| WorkforceMember {
                skills: skills.remove(&employee_id).unwrap_or_default(),
                employee_id,
                name,
                department,
                default_hours,
                allocated_hours,
            })
            .collect())
    }

    /// Allocation rows per employee and project within `range`
    ///
    /// Hours are averaged per week of the range so they compare directly with
    /// weekly contracted hours.
    pub fn query_allocation_records(
        &self,
        range: DateRange,
        filter: &AllocationFilter,
    ) -> Result<Vec<AllocationRecord>> {
        let skills = self.employee_skill_map()?;

        let conn = self.conn()?;
        let required: HashMap<i64, Vec<String>> = {
            let mut stmt = conn.prepare(
                r#"
                SELECT r.project_id, s.name
                FROM project_skill_requirements r
                JOIN skills s ON s.id = r.skill_id
                WHERE r.quantity > 0
                ORDER BY r.project_id, s.name
                "#,
            )?;
            let pairs = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let mut map: HashMap<i64, Vec<String>> = HashMap::new();
            for (project_id, skill) in pairs {
                map.entry(project_id).or_default().push(skill);
            }
            map
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT a.employee_id, a.project_id, SUM(a.allocated_hours), e.default_hours, e.department
            FROM allocations a
            JOIN employees e ON e.id = a.employee_id
            WHERE a.week_start BETWEEN ?1 AND ?2
              AND e.status = 'active'
              AND (?3 IS NULL OR e.department = ?3 COLLATE NOCASE)
            GROUP BY a.employee_id, a.project_id
            ORDER BY a.employee_id, a.project_id
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![
                    range.from.to_string(),
                    range.to.to_string(),
                    filter.department
                ],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let weeks = range.weeks();
        Ok(rows
            .into_iter()
            .map(|(employee_id, project_id, hours, default_hours, department)| AllocationRecord {
                employee_id,
                project_id,
                allocated_hours: hours / weeks,
                default_hours,
                employee_skills: skills
                    .get(&employee_id)
                    .map(|s| s.iter().map(|k| k.skill.clone()).collect())
                    .unwrap_or_default(),
                required_skills: required.get(&project_id).cloned().unwrap_or_default(),
                department: Some(department),
            })
            .collect())
    }
}
