//! Bottleneck record handlers
//!
//! These manage stored bottleneck rows. Classification into current,
//! predicted and historical lives under `/api/capacity/bottlenecks`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use staffline_core::capacity::BottleneckStatus;
use staffline_core::models::{BottleneckRecord, NewBottleneck};

#[derive(Debug, Deserialize)]
pub struct BottleneckListQuery {
    pub status: Option<String>,
}

/// GET /api/bottlenecks - List stored bottlenecks, newest first
pub async fn list_bottlenecks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BottleneckListQuery>,
    request: Request,
) -> Result<Json<Vec<BottleneckRecord>>, AppError> {
    let user_email = get_user_email(request.headers());

    let status: Option<BottleneckStatus> = params
        .status
        .as_deref()
        .map(str::parse::<BottleneckStatus>)
        .transpose()
        .map_err(|e: String| AppError::bad_request(&e))?;

    let records = state.db.list_bottlenecks(status)?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("bottleneck"),
        None,
        Some(&format!("status={:?}, count={}", status, records.len())),
    )?;

    Ok(Json(records))
}

/// POST /api/bottlenecks - Record a newly identified bottleneck
pub async fn record_bottleneck(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewBottleneck>,
) -> Result<Json<BottleneckRecord>, AppError> {
    let user_email = get_user_email(&headers);

    let id = state.db.record_bottleneck(&req)?;

    state.db.log_audit(
        &user_email,
        "create",
        Some("bottleneck"),
        Some(id),
        Some(&format!(
            "type={}, resource={}, impact={}",
            req.bottleneck_type, req.affected_resource, req.impact
        )),
    )?;

    let record = state
        .db
        .list_bottlenecks(Some(BottleneckStatus::Active))?
        .into_iter()
        .find(|b| b.id == id)
        .ok_or_else(|| AppError::not_found("Bottleneck not found after creation"))?;
    Ok(Json(record))
}

/// POST /api/bottlenecks/:id/resolve - Mark a bottleneck resolved
pub async fn resolve_bottleneck(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    state.db.resolve_bottleneck(id)?;

    state
        .db
        .log_audit(&user_email, "resolve", Some("bottleneck"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}
