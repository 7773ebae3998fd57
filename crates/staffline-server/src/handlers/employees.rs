//! Employee and skill catalog handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use staffline_core::models::{
    Employee, EmployeeSkill, EmployeeStatus, NewEmployee, ProficiencyLevel, Skill, SkillCategory,
};

#[derive(Debug, Deserialize)]
pub struct EmployeeQuery {
    pub department: Option<String>,
}

/// GET /api/employees - List employees, optionally for one department
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EmployeeQuery>,
    request: Request,
) -> Result<Json<Vec<Employee>>, AppError> {
    let user_email = get_user_email(request.headers());

    let employees = state.db.list_employees(params.department.as_deref())?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("employee"),
        None,
        Some(&format!(
            "department={:?}, count={}",
            params.department,
            employees.len()
        )),
    )?;

    Ok(Json(employees))
}

/// POST /api/employees - Create an employee
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewEmployee>,
) -> Result<Json<Employee>, AppError> {
    let user_email = get_user_email(&headers);

    let id = state.db.create_employee(&req)?;

    state.db.log_audit(
        &user_email,
        "create",
        Some("employee"),
        Some(id),
        Some(&format!("department={}", req.department)),
    )?;

    let employee = state
        .db
        .get_employee(id)?
        .ok_or_else(|| AppError::not_found("Employee not found after creation"))?;
    Ok(Json(employee))
}

/// GET /api/employees/:id - Get one employee
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Employee>, AppError> {
    let user_email = get_user_email(request.headers());

    let employee = state
        .db
        .get_employee(id)?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    state
        .db
        .log_audit(&user_email, "view", Some("employee"), Some(id), None)?;

    Ok(Json(employee))
}

#[derive(Debug, Deserialize)]
pub struct EmployeeStatusRequest {
    pub status: String,
}

/// POST /api/employees/:id/status - Activate or deactivate an employee
pub async fn set_employee_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<EmployeeStatusRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(&headers);

    let status: EmployeeStatus = req
        .status
        .parse()
        .map_err(|e: String| AppError::bad_request(&e))?;
    state.db.set_employee_status(id, status)?;

    state.db.log_audit(
        &user_email,
        "update",
        Some("employee"),
        Some(id),
        Some(&format!("status={}", status)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/employees/:id/skills - Skills held by an employee
pub async fn list_employee_skills(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Vec<EmployeeSkill>>, AppError> {
    let user_email = get_user_email(request.headers());

    if state.db.get_employee(id)?.is_none() {
        return Err(AppError::not_found("Employee not found"));
    }
    let skills = state.db.list_employee_skills(id)?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("employee_skill"),
        Some(id),
        Some(&format!("count={}", skills.len())),
    )?;

    Ok(Json(skills))
}

#[derive(Debug, Deserialize)]
pub struct AssignSkillRequest {
    pub skill: String,
    pub level: ProficiencyLevel,
}

/// POST /api/employees/:id/skills - Assign (or re-level) a skill
pub async fn assign_employee_skill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<AssignSkillRequest>,
) -> Result<Json<Vec<EmployeeSkill>>, AppError> {
    let user_email = get_user_email(&headers);

    state.db.assign_skill(id, &req.skill, req.level)?;

    state.db.log_audit(
        &user_email,
        "assign",
        Some("employee_skill"),
        Some(id),
        Some(&format!("skill={}, level={}", req.skill, req.level)),
    )?;

    Ok(Json(state.db.list_employee_skills(id)?))
}

/// GET /api/skills - The skill catalog
pub async fn list_skills(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<Skill>>, AppError> {
    let user_email = get_user_email(request.headers());

    let skills = state.db.list_skills()?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("skill"),
        None,
        Some(&format!("count={}", skills.len())),
    )?;

    Ok(Json(skills))
}

#[derive(Debug, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    #[serde(default)]
    pub category: SkillCategory,
}

/// POST /api/skills - Add a skill to the catalog (idempotent by name)
pub async fn create_skill(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateSkillRequest>,
) -> Result<Json<Skill>, AppError> {
    let user_email = get_user_email(&headers);

    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Skill name is required"));
    }
    let id = state.db.upsert_skill(name, req.category)?;

    state.db.log_audit(
        &user_email,
        "create",
        Some("skill"),
        Some(id),
        Some(&format!("name={}", name)),
    )?;

    let skill = state
        .db
        .list_skills()?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| AppError::not_found("Skill not found after creation"))?;
    Ok(Json(skill))
}
