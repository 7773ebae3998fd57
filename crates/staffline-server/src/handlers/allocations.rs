//! Allocation handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::HeaderMap,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use staffline_core::capacity::DateRange;
use staffline_core::models::{Allocation, NewAllocation};

/// Query parameters for listing allocations
#[derive(Debug, Deserialize)]
pub struct AllocationQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub employee_id: Option<i64>,
}

fn parse_date_param(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    value
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AppError::bad_request(&format!("Invalid {} date format (use YYYY-MM-DD)", name)))
}

// Open-ended bounds that still sort correctly as stored "YYYY-MM-DD" text
fn earliest() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn latest() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// GET /api/allocations - List allocations by week range and employee
pub async fn list_allocations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AllocationQuery>,
    request: Request,
) -> Result<Json<Vec<Allocation>>, AppError> {
    let user_email = get_user_email(request.headers());

    let from = parse_date_param("from", params.from.as_deref())?;
    let to = parse_date_param("to", params.to.as_deref())?;
    let range = match (from, to) {
        (None, None) => None,
        (from, to) => {
            let from = from.unwrap_or(earliest());
            let to = to.unwrap_or(latest());
            if to < from {
                return Err(AppError::bad_request("'to' is before 'from'"));
            }
            Some(DateRange::new(from, to))
        }
    };

    let allocations = state.db.list_allocations(range, params.employee_id)?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("allocation"),
        None,
        Some(&format!(
            "from={:?}, to={:?}, employee_id={:?}, count={}",
            from,
            to,
            params.employee_id,
            allocations.len()
        )),
    )?;

    Ok(Json(allocations))
}

/// POST /api/allocations - Allocate an employee to a project for one week
pub async fn create_allocation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewAllocation>,
) -> Result<Json<Allocation>, AppError> {
    let user_email = get_user_email(&headers);

    let id = state.db.create_allocation(&req)?;

    state.db.log_audit(
        &user_email,
        "create",
        Some("allocation"),
        Some(id),
        Some(&format!(
            "employee_id={}, project_id={}, week={}, hours={}",
            req.employee_id, req.project_id, req.week_start, req.allocated_hours
        )),
    )?;

    let week = DateRange::new(req.week_start, req.week_start);
    let allocation = state
        .db
        .list_allocations(Some(week), Some(req.employee_id))?
        .into_iter()
        .find(|a| a.id == id)
        .ok_or_else(|| AppError::not_found("Allocation not found after creation"))?;
    Ok(Json(allocation))
}

/// DELETE /api/allocations/:id - Remove an allocation
pub async fn delete_allocation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    if !state.db.delete_allocation(id)? {
        return Err(AppError::not_found("Allocation not found"));
    }

    state
        .db
        .log_audit(&user_email, "delete", Some("allocation"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}
