//! Project handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use staffline_core::models::{NewProject, Project, ProjectSkillRequirement, ProjectStatus};

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub status: Option<String>,
}

/// GET /api/projects - List projects, optionally with one status
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProjectQuery>,
    request: Request,
) -> Result<Json<Vec<Project>>, AppError> {
    let user_email = get_user_email(request.headers());

    let status: Option<ProjectStatus> = params
        .status
        .as_deref()
        .map(str::parse::<ProjectStatus>)
        .transpose()
        .map_err(|e: String| AppError::bad_request(&e))?;

    let projects = state.db.list_projects(status)?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("project"),
        None,
        Some(&format!("status={:?}, count={}", status, projects.len())),
    )?;

    Ok(Json(projects))
}

/// POST /api/projects - Create a project
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewProject>,
) -> Result<Json<Project>, AppError> {
    let user_email = get_user_email(&headers);

    let id = state.db.create_project(&req)?;

    state.db.log_audit(
        &user_email,
        "create",
        Some("project"),
        Some(id),
        Some(&format!("name={}, status={}", req.name, req.status)),
    )?;

    let project = state
        .db
        .get_project(id)?
        .ok_or_else(|| AppError::not_found("Project not found after creation"))?;
    Ok(Json(project))
}

/// GET /api/projects/:id - Get one project
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Project>, AppError> {
    let user_email = get_user_email(request.headers());

    let project = state
        .db
        .get_project(id)?
        .ok_or_else(|| AppError::not_found("Project not found"))?;

    state
        .db
        .log_audit(&user_email, "view", Some("project"), Some(id), None)?;

    Ok(Json(project))
}

/// GET /api/projects/:id/requirements - Skill headcount a project asks for
pub async fn list_requirements(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Vec<ProjectSkillRequirement>>, AppError> {
    let user_email = get_user_email(request.headers());

    if state.db.get_project(id)?.is_none() {
        return Err(AppError::not_found("Project not found"));
    }
    let requirements = state.db.list_project_requirements(id)?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("project_requirement"),
        Some(id),
        Some(&format!("count={}", requirements.len())),
    )?;

    Ok(Json(requirements))
}

#[derive(Debug, Deserialize)]
pub struct RequirementRequest {
    pub skill: String,
    pub quantity: i64,
}

/// POST /api/projects/:id/requirements - Set the headcount for one skill
pub async fn set_requirement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<RequirementRequest>,
) -> Result<Json<Vec<ProjectSkillRequirement>>, AppError> {
    let user_email = get_user_email(&headers);

    state.db.set_project_requirement(id, &req.skill, req.quantity)?;

    state.db.log_audit(
        &user_email,
        "update",
        Some("project_requirement"),
        Some(id),
        Some(&format!("skill={}, quantity={}", req.skill, req.quantity)),
    )?;

    Ok(Json(state.db.list_project_requirements(id)?))
}

#[derive(Debug, Deserialize)]
pub struct ProjectStatusRequest {
    pub status: ProjectStatus,
}

/// POST /api/projects/:id/status - Move a project through its lifecycle
pub async fn update_project_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<ProjectStatusRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(&headers);

    state.db.update_project_status(id, req.status)?;

    state.db.log_audit(
        &user_email,
        "update",
        Some("project"),
        Some(id),
        Some(&format!("status={}", req.status)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}
