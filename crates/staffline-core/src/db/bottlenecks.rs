//! Bottleneck records
//!
//! Severity is stored for listing, but always derived from impact on write.

use chrono::Utc;
use rusqlite::params;

use super::{format_datetime, parse_datetime, Database};
use crate::capacity::gateway::{BottleneckFilter, BottleneckRow};
use crate::capacity::types::{BottleneckStatus, BottleneckType, Severity};
use crate::error::{Error, Result};
use crate::models::{BottleneckRecord, NewBottleneck};

fn parse_enum<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse().map_err(Error::InvalidData)
}

impl Database {
    /// Record a newly identified bottleneck
    pub fn record_bottleneck(&self, bottleneck: &NewBottleneck) -> Result<i64> {
        if !(0.0..=100.0).contains(&bottleneck.impact) {
            return Err(Error::InvalidData(format!(
                "Impact must be within 0-100, got {}",
                bottleneck.impact
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO bottlenecks (
                type, affected_resource, severity, impact, affected_projects,
                estimated_duration_days, root_causes, recommended_actions, status
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'active')
            "#,
            params![
                bottleneck.bottleneck_type.as_str(),
                bottleneck.affected_resource,
                Severity::from_impact(bottleneck.impact).as_str(),
                bottleneck.impact,
                serde_json::to_string(&bottleneck.affected_projects)?,
                bottleneck.estimated_duration_days,
                serde_json::to_string(&bottleneck.root_causes)?,
                serde_json::to_string(&bottleneck.recommended_actions)?,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Mark a bottleneck resolved now
    pub fn resolve_bottleneck(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE bottlenecks SET status = 'resolved', resolved_at = ? WHERE id = ? AND status != 'resolved'",
            params![format_datetime(&Utc::now()), id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("Unresolved bottleneck {}", id)));
        }
        Ok(())
    }

    /// List bottlenecks, newest first
    pub fn list_bottlenecks(&self, status: Option<BottleneckStatus>) -> Result<Vec<BottleneckRecord>> {
        let rows = self.query_bottlenecks(&BottleneckFilter {
            status,
            ..Default::default()
        })?;

        let mut records: Vec<BottleneckRecord> = rows
            .into_iter()
            .map(|row| BottleneckRecord {
                id: row.id,
                bottleneck_type: row.bottleneck_type,
                affected_resource: row.affected_resource,
                severity: Severity::from_impact(row.impact),
                impact: row.impact,
                status: row.status,
                identified_at: row.identified_at,
                resolved_at: row.resolved_at,
            })
            .collect();
        records.sort_by(|a, b| b.identified_at.cmp(&a.identified_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    /// Bottleneck rows matching a filter
    ///
    /// `since` constrains `resolved_at` for resolved rows and `identified_at`
    /// otherwise.
    pub fn query_bottlenecks(&self, filter: &BottleneckFilter) -> Result<Vec<BottleneckRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, type, affected_resource, impact, affected_projects,
                   estimated_duration_days, root_causes, recommended_actions,
                   status, identified_at, resolved_at
            FROM bottlenecks
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR severity = ?2)
              AND (?3 IS NULL OR
                   CASE WHEN status = 'resolved' THEN date(resolved_at) ELSE date(identified_at) END >= ?3)
            ORDER BY impact DESC, id
            "#,
        )?;

        let raw = stmt
            .query_map(
                params![
                    filter.status.map(|s| s.as_str()),
                    filter.severity.map(|s| s.as_str()),
                    filter.since.map(|d| d.to_string()),
                ],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, Option<String>>(10)?,
                    ))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(id, kind, resource, impact, projects, duration, causes, actions, status, identified, resolved)| {
                    Ok(BottleneckRow {
                        id,
                        bottleneck_type: parse_enum::<BottleneckType>(&kind)?,
                        affected_resource: resource,
                        impact,
                        affected_projects: serde_json::from_str(&projects)?,
                        estimated_duration_days: duration,
                        root_causes: serde_json::from_str(&causes)?,
                        recommended_actions: serde_json::from_str(&actions)?,
                        status: parse_enum::<BottleneckStatus>(&status)?,
                        identified_at: parse_datetime(&identified)?,
                        resolved_at: resolved.as_deref().map(parse_datetime).transpose()?,
                    })
                },
            )
            .collect()
    }

    /// Backdate a bottleneck (seeding and tests)
    pub fn set_bottleneck_timestamps(
        &self,
        id: i64,
        identified_at: chrono::DateTime<Utc>,
        resolved_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let status = if resolved_at.is_some() { "resolved" } else { "active" };
        conn.execute(
            "UPDATE bottlenecks SET identified_at = ?, resolved_at = ?, status = ? WHERE id = ?",
            params![
                format_datetime(&identified_at),
                resolved_at.as_ref().map(format_datetime),
                status,
                id
            ],
        )?;
        Ok(())
    }
}
