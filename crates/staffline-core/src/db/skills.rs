//! Skill catalog operations

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::Result;
use crate::models::{Skill, SkillCategory};

impl Database {
    /// Create a skill, or return the id of the existing one with that name
    pub fn upsert_skill(&self, name: &str, category: SkillCategory) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM skills WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO skills (name, category) VALUES (?, ?)",
            params![name, category.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_skill_id(&self, name: &str) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM skills WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// List all skills by name
    pub fn list_skills(&self) -> Result<Vec<Skill>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, category FROM skills ORDER BY name")?;

        let skills = stmt
            .query_map([], |row| {
                let category: String = row.get(2)?;
                Ok(Skill {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: category.parse().unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(skills)
    }
}
