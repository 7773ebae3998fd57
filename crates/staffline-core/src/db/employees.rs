//! Employee operations

use rusqlite::{params, OptionalExtension, Row};

use super::{datetime_column, Database};
use crate::error::{Error, Result};
use crate::models::{Employee, EmployeeSkill, EmployeeStatus, NewEmployee, ProficiencyLevel};

const EMPLOYEE_COLUMNS: &str = "id, name, department, default_hours, status, created_at";

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    let status: String = row.get(4)?;
    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        department: row.get(2)?,
        default_hours: row.get(3)?,
        status: status.parse().unwrap_or_default(),
        created_at: datetime_column(row, 5)?,
    })
}

impl Database {
    /// Create an employee
    pub fn create_employee(&self, employee: &NewEmployee) -> Result<i64> {
        if employee.name.trim().is_empty() || employee.department.trim().is_empty() {
            return Err(Error::InvalidData(
                "Employee name and department are required".to_string(),
            ));
        }
        if !employee.default_hours.is_finite() || employee.default_hours < 0.0 {
            return Err(Error::InvalidData(format!(
                "Default hours must be non-negative, got {}",
                employee.default_hours
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO employees (name, department, default_hours) VALUES (?, ?, ?)",
            params![
                employee.name.trim(),
                employee.department.trim(),
                employee.default_hours
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_employee(&self, id: i64) -> Result<Option<Employee>> {
        let conn = self.conn()?;
        let employee = conn
            .query_row(
                &format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS),
                params![id],
                employee_from_row,
            )
            .optional()?;
        Ok(employee)
    }

    /// List employees, optionally for one department
    pub fn list_employees(&self, department: Option<&str>) -> Result<Vec<Employee>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM employees WHERE (?1 IS NULL OR department = ?1 COLLATE NOCASE) ORDER BY department, name",
            EMPLOYEE_COLUMNS
        ))?;

        let employees = stmt
            .query_map(params![department], employee_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(employees)
    }

    /// Set an employee active or inactive
    pub fn set_employee_status(&self, id: i64, status: EmployeeStatus) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE employees SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("Employee {}", id)));
        }
        Ok(())
    }

    /// Record that an employee holds a skill, replacing any previous level
    pub fn assign_skill(&self, employee_id: i64, skill: &str, level: ProficiencyLevel) -> Result<()> {
        let skill_id = self
            .find_skill_id(skill)?
            .ok_or_else(|| Error::NotFound(format!("Skill '{}'", skill)))?;
        if self.get_employee(employee_id)?.is_none() {
            return Err(Error::NotFound(format!("Employee {}", employee_id)));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO employee_skills (employee_id, skill_id, level) VALUES (?, ?, ?)
            ON CONFLICT (employee_id, skill_id) DO UPDATE SET level = excluded.level
            "#,
            params![employee_id, skill_id, level.as_str()],
        )?;
        Ok(())
    }

    /// Skills held by an employee, strongest first
    pub fn list_employee_skills(&self, employee_id: i64) -> Result<Vec<EmployeeSkill>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.name, s.category, es.level
            FROM employee_skills es
            JOIN skills s ON s.id = es.skill_id
            WHERE es.employee_id = ?
            ORDER BY s.name
            "#,
        )?;

        let mut skills = stmt
            .query_map(params![employee_id], |row| {
                let category: String = row.get(1)?;
                let level: String = row.get(2)?;
                Ok((row.get::<_, String>(0)?, category, level))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|(skill, category, level)| {
                Some(EmployeeSkill {
                    skill,
                    category: category.parse().unwrap_or_default(),
                    level: level.parse().ok()?,
                })
            })
            .collect::<Vec<_>>();

        skills.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.skill.cmp(&b.skill)));
        Ok(skills)
    }
}
