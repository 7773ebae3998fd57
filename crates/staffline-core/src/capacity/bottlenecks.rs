//! Bottleneck identification
//!
//! Stored bottleneck rows are read into current, predicted and historical
//! buckets. The buckets are independent: every active row is current, and a
//! recent or long-running one is also predicted. Severity is never read from
//! storage; it is always re-derived from the impact score so every bottleneck
//! honors the same bands.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::gateway::BottleneckRow;
use super::types::{Bottleneck, BottleneckStatus, Severity};

/// Active bottlenecks identified within this many days count as predicted
pub const RECENT_WINDOW_DAYS: i64 = 7;
/// Active bottlenecks expected to last longer than this count as predicted
pub const LONG_RUNNING_DAYS: i64 = 7;

/// Map a stored row to a bottleneck with the given status
pub fn map_row(row: &BottleneckRow, status: BottleneckStatus) -> Bottleneck {
    Bottleneck {
        bottleneck_type: row.bottleneck_type,
        affected_resource: row.affected_resource.clone(),
        severity: Severity::from_impact(row.impact),
        impact: row.impact.clamp(0.0, 100.0),
        affected_projects: row.affected_projects.clone(),
        estimated_duration: row.estimated_duration_days.max(0),
        root_causes: row.root_causes.clone(),
        recommended_actions: row.recommended_actions.clone(),
        status,
    }
}

fn matches_severity(row: &BottleneckRow, severity: Option<Severity>) -> bool {
    severity.map_or(true, |s| Severity::from_impact(row.impact) == s)
}

fn by_impact_desc(a: &Bottleneck, b: &Bottleneck) -> std::cmp::Ordering {
    b.impact
        .partial_cmp(&a.impact)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.affected_resource.cmp(&b.affected_resource))
}

/// Active bottlenecks, highest impact first
pub fn current_bottlenecks(rows: &[BottleneckRow], severity: Option<Severity>) -> Vec<Bottleneck> {
    let mut current: Vec<Bottleneck> = rows
        .iter()
        .filter(|r| r.status == BottleneckStatus::Active && matches_severity(r, severity))
        .map(|r| map_row(r, BottleneckStatus::Active))
        .collect();
    current.sort_by(by_impact_desc);
    current
}

/// Active bottlenecks that are either new or expected to persist
pub fn predicted_bottlenecks(
    rows: &[BottleneckRow],
    severity: Option<Severity>,
    now: DateTime<Utc>,
) -> Vec<Bottleneck> {
    let recent_cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let mut predicted: Vec<Bottleneck> = rows
        .iter()
        .filter(|r| r.status == BottleneckStatus::Active && matches_severity(r, severity))
        .filter(|r| r.identified_at >= recent_cutoff || r.estimated_duration_days > LONG_RUNNING_DAYS)
        .map(|r| map_row(r, BottleneckStatus::Predicted))
        .collect();
    predicted.sort_by(by_impact_desc);
    predicted
}

/// Bottlenecks resolved on or after `since`, most recent first, at most `limit`
pub fn historical_bottlenecks(
    rows: &[BottleneckRow],
    severity: Option<Severity>,
    since: NaiveDate,
    limit: usize,
) -> Vec<Bottleneck> {
    let mut resolved: Vec<&BottleneckRow> = rows
        .iter()
        .filter(|r| r.status == BottleneckStatus::Resolved && matches_severity(r, severity))
        .filter(|r| r.resolved_at.is_some_and(|at| at.date_naive() >= since))
        .collect();
    resolved.sort_by(|a, b| b.resolved_at.cmp(&a.resolved_at));

    resolved
        .into_iter()
        .take(limit)
        .map(|r| map_row(r, BottleneckStatus::Resolved))
        .collect()
}
