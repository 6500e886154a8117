/// Project endpoints
///
/// - `GET /api/projects/` - all projects, newest first (cached)
/// - `POST /api/projects/` - create; the caller becomes the owner
/// - `GET /api/projects/:id/`
/// - `PUT /api/projects/:id/` - full update, `name` required
/// - `PATCH /api/projects/:id/` - partial update
/// - `DELETE /api/projects/:id/` - also deletes the project's tasks
///
/// Owner and members render as usernames and cannot be written here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use kanbanflow_shared::{
    auth::middleware::AuthContext,
    models::project::{CreateProject, Project, UpdateProject},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::{cached_json, parse_id, require_fields};
use crate::{
    app::AppState,
    cache::CacheKey,
    error::{ApiError, ApiResult},
    extract::{deserialize_trimmed, ApiJson},
    middleware::identity::resolve_actor,
};

/// Project representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,

    /// Owner's username
    pub owner: String,

    /// Members' usernames
    pub members: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            owner: project.owner,
            members: project.members,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Body of create, PUT and PATCH
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProjectPayload {
    #[serde(default, deserialize_with = "deserialize_trimmed")]
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

impl ProjectPayload {
    fn validate_full(&self) -> ApiResult<()> {
        self.validate()?;
        require_fields(&[("name", self.name.is_some())])
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Project not found".to_string())
}

/// Lists every project, newest first
///
/// Served from the response cache when a fresh entry exists; writes do not
/// invalidate it.
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Response> {
    let key = CacheKey::ProjectList;

    if let Some(hit) = state.cache.get(&key) {
        debug!("Project list served from cache");
        return Ok(cached_json(&hit.body, hit.remaining));
    }

    let projects: Vec<ProjectResponse> = Project::list(&state.db)
        .await?
        .into_iter()
        .map(ProjectResponse::from)
        .collect();

    let ttl = state.config.cache.project_list_ttl();
    let body = serde_json::to_value(projects)
        .map_err(|e| ApiError::InternalError(format!("Serialization failed: {}", e)))?;
    let body = state.cache.insert(key, body, ttl);

    debug!("Project list cached");
    Ok(cached_json(&body, ttl))
}

/// Creates a project owned by the calling user
///
/// # Errors
///
/// - `400 Bad Request`: `name` missing, blank, or longer than 200 characters
/// - `401 Unauthorized`: anonymous caller with the placeholder fallback off
pub async fn create_project(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    ApiJson(req): ApiJson<ProjectPayload>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    req.validate_full()?;

    let actor = resolve_actor(&state, auth.as_deref()).await?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            owner_id: actor.id(),
        },
    )
    .await?;

    info!(project_id = %project.id, owner = %project.owner, "Project created");
    Ok((StatusCode::CREATED, Json(project.into())))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectResponse>> {
    let id = parse_id(&id, "Project")?;

    let project = Project::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(Json(project.into()))
}

async fn apply_update(state: &AppState, id: Uuid, req: ProjectPayload) -> ApiResult<ProjectResponse> {
    let project = Project::update(
        &state.db,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(project.into())
}

/// Full update; `name` is required
pub async fn replace_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ProjectPayload>,
) -> ApiResult<Json<ProjectResponse>> {
    let id = parse_id(&id, "Project")?;
    req.validate_full()?;

    Ok(Json(apply_update(&state, id, req).await?))
}

/// Partial update; absent fields keep their value
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ProjectPayload>,
) -> ApiResult<Json<ProjectResponse>> {
    let id = parse_id(&id, "Project")?;
    req.validate()?;

    Ok(Json(apply_update(&state, id, req).await?))
}

/// Deletes a project and, by cascade, its tasks
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "Project")?;

    if !Project::delete(&state.db, id).await? {
        return Err(not_found());
    }

    info!(project_id = %id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_payload_requires_name() {
        let payload = ProjectPayload {
            description: Some("no name".to_string()),
            ..Default::default()
        };
        assert!(matches!(payload.validate_full(), Err(ApiError::ValidationError(_))));
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_name_length_limits() {
        let blank = ProjectPayload {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());

        let whitespace: ProjectPayload = serde_json::from_str(r#"{"name": "   "}"#).unwrap();
        assert!(whitespace.validate_full().is_err());

        let long = ProjectPayload {
            name: Some("x".repeat(201)),
            ..Default::default()
        };
        assert!(long.validate().is_err());

        let ok = ProjectPayload {
            name: Some("x".repeat(200)),
            ..Default::default()
        };
        assert!(ok.validate_full().is_ok());
    }
}
