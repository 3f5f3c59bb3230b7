//! API request handlers with proper error propagation.
//!
//! Mutations commit to the store first and publish to the hub second, so a
//! subscriber can never observe a notification for state that was not
//! actually stored.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use super::{ApiResponse, AppState};
use crate::error::NetsimError;
use crate::events::{validate_event, EventPayload};
use crate::projects::{CreateProjectRequest, UpdateProjectRequest};

const MAX_NAME_LENGTH: usize = 120;
const MAX_TAGS: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// Health Check
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let hub = state.hub.stats();
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "projects": state.store.len(),
        "subscribers": hub.active_subscribers,
    }))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Project Handlers
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, NetsimError> {
    let summaries = state.store.summaries().await;
    Ok(Json(ApiResponse::success(summaries)))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, NetsimError> {
    validate_name(&req.name)?;
    if let Some(tags) = &req.tags {
        validate_tags(tags)?;
    }

    let project = state.store.create(req).await;
    state.hub.project_created(project.clone());

    Ok((StatusCode::CREATED, Json(ApiResponse::success(project))))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, NetsimError> {
    let project = state
        .store
        .get(id)
        .await
        .ok_or_else(|| NetsimError::project_not_found(id))?;

    Ok(Json(ApiResponse::success(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, NetsimError> {
    if let Some(name) = &req.name {
        validate_name(name)?;
    }
    if let Some(tags) = &req.tags {
        validate_tags(tags)?;
    }

    let project = state.store.update(id, req).await?;
    state.hub.project_updated(project.clone());

    Ok(Json(ApiResponse::success(project)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, NetsimError> {
    if !state.store.delete(id).await {
        return Err(NetsimError::project_not_found(id));
    }
    state.hub.project_deleted(id);

    Ok(Json(ApiResponse::success(serde_json::json!({
        "id": id,
        "deleted": true
    }))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Event Submission
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn submit_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, NetsimError> {
    let event = payload.hydrate(id)?;
    validate_event(&event)?;

    let project = state.store.record_event(id, event.clone()).await?;
    state.hub.simulation_event(event);

    Ok(Json(ApiResponse::success(project)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request validation helpers
// ═══════════════════════════════════════════════════════════════════════════════

fn validate_name(name: &str) -> Result<(), NetsimError> {
    if name.trim().is_empty() {
        return Err(NetsimError::validation("Project name cannot be empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(NetsimError::validation(format!(
            "Project name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), NetsimError> {
    if tags.len() > MAX_TAGS {
        return Err(NetsimError::validation(format!(
            "A project cannot carry more than {MAX_TAGS} tags"
        )));
    }
    Ok(())
}
