//! Project operations

use rusqlite::{params, OptionalExtension, Row};

use super::{datetime_column, parse_date, Database};
use crate::error::{Error, Result};
use crate::models::{NewProject, Project, ProjectSkillRequirement, ProjectStatus};

const PROJECT_COLUMNS: &str = "id, name, status, start_date, end_date, created_at";

/// Most people a project may request for one skill
pub const MAX_REQUIREMENT_QUANTITY: i64 = 10_000;

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let status: String = row.get(2)?;
    let start: Option<String> = row.get(3)?;
    let end: Option<String> = row.get(4)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        status: status.parse().unwrap_or_default(),
        start_date: start.and_then(|s| parse_date(&s).ok()),
        end_date: end.and_then(|s| parse_date(&s).ok()),
        created_at: datetime_column(row, 5)?,
    })
}

impl Database {
    pub fn create_project(&self, project: &NewProject) -> Result<i64> {
        if project.name.trim().is_empty() {
            return Err(Error::InvalidData("Project name is required".to_string()));
        }
        if let (Some(start), Some(end)) = (project.start_date, project.end_date) {
            if end < start {
                return Err(Error::InvalidData(format!(
                    "Project ends ({}) before it starts ({})",
                    end, start
                )));
            }
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO projects (name, status, start_date, end_date) VALUES (?, ?, ?, ?)",
            params![
                project.name.trim(),
                project.status.as_str(),
                project.start_date.map(|d| d.to_string()),
                project.end_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.conn()?;
        let project = conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS),
                params![id],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    /// List projects, optionally with one status
    pub fn list_projects(&self, status: Option<ProjectStatus>) -> Result<Vec<Project>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM projects WHERE (?1 IS NULL OR status = ?1) ORDER BY name",
            PROJECT_COLUMNS
        ))?;

        let projects = stmt
            .query_map(params![status.map(|s| s.as_str())], project_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn update_project_status(&self, id: i64, status: ProjectStatus) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE projects SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("Project {}", id)));
        }
        Ok(())
    }

    /// Request `quantity` people with `skill` on a project
    pub fn set_project_requirement(&self, project_id: i64, skill: &str, quantity: i64) -> Result<()> {
        if !(0..=MAX_REQUIREMENT_QUANTITY).contains(&quantity) {
            return Err(Error::InvalidData(format!(
                "Requirement quantity must be within 0-{}, got {}",
                MAX_REQUIREMENT_QUANTITY, quantity
            )));
        }
        let skill_id = self
            .find_skill_id(skill)?
            .ok_or_else(|| Error::NotFound(format!("Skill '{}'", skill)))?;
        if self.get_project(project_id)?.is_none() {
            return Err(Error::NotFound(format!("Project {}", project_id)));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO project_skill_requirements (project_id, skill_id, quantity) VALUES (?, ?, ?)
            ON CONFLICT (project_id, skill_id) DO UPDATE SET quantity = excluded.quantity
            "#,
            params![project_id, skill_id, quantity],
        )?;
        Ok(())
    }

    pub fn list_project_requirements(&self, project_id: i64) -> Result<Vec<ProjectSkillRequirement>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.project_id, s.name, r.quantity
            FROM project_skill_requirements r
            JOIN skills s ON s.id = r.skill_id
            WHERE r.project_id = ?
            ORDER BY s.name
            "#,
        )?;

        let requirements = stmt
            .query_map(params![project_id], |row| {
                Ok(ProjectSkillRequirement {
                    project_id: row.get(0)?,
                    skill: row.get(1)?,
                    quantity: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(requirements)
    }
}
