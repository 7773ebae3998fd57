//! Audit trail of who read or changed planning data

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use serde::Deserialize;

use crate::{get_user_email, AppError, AppState, MAX_PAGE_LIMIT};
use staffline_core::{AuditEntry, AuditFilter};

const DEFAULT_AUDIT_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
    /// e.g. `report`, `create`, `resolve`
    pub action: Option<String>,
    /// e.g. `scenario`, `employee`, `bottleneck`
    pub entity_type: Option<String>,
}

/// GET /api/audit - Recent audit entries, optionally for one action or entity type
pub async fn list_audit_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQuery>,
    request: Request,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    let user_email = get_user_email(request.headers());
    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let filter = AuditFilter {
        action: params.action,
        entity_type: params.entity_type,
    };

    let entries = state.db.list_audit_log(&filter, limit)?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("audit_log"),
        None,
        Some(&format!(
            "limit={}, action={:?}, entity_type={:?}",
            limit, filter.action, filter.entity_type
        )),
    )?;

    Ok(Json(entries))
}
