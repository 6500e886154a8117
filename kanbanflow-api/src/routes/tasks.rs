/// Task endpoints
///
/// - `GET /api/tasks/?project=<id>` - newest first, optionally one project
///   (cached per filter value)
/// - `POST /api/tasks/` - create; the caller becomes `created_by`
/// - `GET /api/tasks/:id/`
/// - `PUT /api/tasks/:id/` - full update, `title` and `project` required
/// - `PATCH /api/tasks/:id/` - partial update
/// - `DELETE /api/tasks/:id/`
/// - `PATCH /api/tasks/:id/update_status/` - `{"status": "<value>"}`
///
/// `project` renders as the project ID; `assigned_to` and `created_by`
/// render as usernames.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use kanbanflow_shared::{
    auth::middleware::AuthContext,
    models::task::{CreateTask, Task, TaskFilter, TaskPriority, TaskStatus, UpdateTask},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::{cached_json, parse_id, require_fields};
use crate::{
    app::AppState,
    cache::CacheKey,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{deserialize_some, deserialize_trimmed, ApiJson},
    middleware::identity::resolve_actor,
};

/// Task representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,

    /// Project ID
    pub project: Uuid,

    /// Assignee's username
    pub assigned_to: Option<String>,

    /// Creator's username
    pub created_by: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            project: task.project_id,
            assigned_to: task.assigned_to_username,
            created_by: task.created_by_username,
            created_at: task.created_at,
            updated_at: task.updated_at,
            due_date: task.due_date,
        }
    }
}

/// Body of create, PUT and PATCH
///
/// `status` and `priority` arrive as strings so an unknown value is reported
/// against its field. `assigned_to` and `due_date` accept `null` to clear.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TaskPayload {
    #[serde(default, deserialize_with = "deserialize_trimmed")]
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<String>,

    pub priority: Option<String>,

    pub project: Option<Uuid>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub assigned_to: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Payload with enumerations parsed
#[derive(Debug)]
struct ParsedTask {
    payload: TaskPayload,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
}

impl TaskPayload {
    /// Validates field contents, collecting every error
    fn parse(self) -> ApiResult<ParsedTask> {
        let mut errors: Vec<ValidationErrorDetail> = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => match ApiError::from(e) {
                ApiError::ValidationError(details) => details,
                other => return Err(other),
            },
        };

        let status = parse_choice::<TaskStatus>(self.status.as_deref(), "status", &mut errors);
        let priority =
            parse_choice::<TaskPriority>(self.priority.as_deref(), "priority", &mut errors);

        if !errors.is_empty() {
            return Err(ApiError::ValidationError(errors));
        }

        Ok(ParsedTask {
            payload: self,
            status,
            priority,
        })
    }

    /// Validates a create or full replacement
    fn parse_full(self) -> ApiResult<ParsedTask> {
        require_fields(&[
            ("title", self.title.is_some()),
            ("project", self.project.is_some()),
        ])?;
        self.parse()
    }
}

fn parse_choice<T>(raw: Option<&str>, field: &str, errors: &mut Vec<ValidationErrorDetail>) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(T::from_str) {
        Some(Ok(value)) => Some(value),
        Some(Err(e)) => {
            errors.push(ValidationErrorDetail::new(field, e.to_string()));
            None
        }
        None => None,
    }
}

impl From<ParsedTask> for UpdateTask {
    fn from(parsed: ParsedTask) -> Self {
        UpdateTask {
            title: parsed.payload.title,
            description: parsed.payload.description,
            status: parsed.status,
            priority: parsed.priority,
            project_id: parsed.payload.project,
            assigned_to: parsed.payload.assigned_to,
            due_date: parsed.payload.due_date,
        }
    }
}

/// Query string of the task listing
#[derive(Debug, Default, Deserialize)]
pub struct TaskListParams {
    pub project: Option<String>,
}

impl TaskListParams {
    /// The project filter; an empty value means no filter
    fn project_filter(&self) -> ApiResult<Option<Uuid>> {
        match self.project.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ApiError::field("project", format!("\"{}\" is not a valid UUID.", raw))),
        }
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Lists tasks, newest first, optionally for one project
///
/// Each filter value is cached separately; writes do not invalidate.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> ApiResult<Response> {
    let project = params.project_filter()?;
    let key = CacheKey::TaskList { project };

    if let Some(hit) = state.cache.get(&key) {
        debug!(project = ?project, "Task list served from cache");
        return Ok(cached_json(&hit.body, hit.remaining));
    }

    let tasks: Vec<TaskResponse> = Task::list(&state.db, TaskFilter { project_id: project })
        .await?
        .into_iter()
        .map(TaskResponse::from)
        .collect();

    let ttl = state.config.cache.task_list_ttl();
    let body = serde_json::to_value(tasks)
        .map_err(|e| ApiError::InternalError(format!("Serialization failed: {}", e)))?;
    let body = state.cache.insert(key, body, ttl);

    debug!(project = ?project, "Task list cached");
    Ok(cached_json(&body, ttl))
}

/// Creates a task attributed to the calling user
///
/// # Errors
///
/// - `400 Bad Request`: `title` or `project` missing, unknown `project` or
///   `assigned_to`, invalid `status`/`priority`
/// - `401 Unauthorized`: anonymous caller with the placeholder fallback off
pub async fn create_task(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    ApiJson(req): ApiJson<TaskPayload>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let parsed = req.parse_full()?;
    let Some(project_id) = parsed.payload.project else {
        return Err(ApiError::field("project", "This field is required."));
    };

    let actor = resolve_actor(&state, auth.as_deref()).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            description: parsed.payload.description.unwrap_or_default(),
            status: parsed.status.unwrap_or_default(),
            priority: parsed.priority.unwrap_or_default(),
            assigned_to: parsed.payload.assigned_to.flatten(),
            due_date: parsed.payload.due_date.flatten(),
            ..CreateTask::new(
                parsed.payload.title.unwrap_or_default(),
                project_id,
                actor.id(),
            )
        },
    )
    .await?;

    info!(task_id = %task.id, project_id = %task.project_id, "Task created");
    Ok((StatusCode::CREATED, Json(task.into())))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_id(&id, "Task")?;

    let task = Task::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(Json(task.into()))
}

async fn apply_update(state: &AppState, id: Uuid, parsed: ParsedTask) -> ApiResult<TaskResponse> {
    let task = Task::update(&state.db, id, parsed.into())
        .await?
        .ok_or_else(not_found)?;

    debug!(task_id = %task.id, "Task updated");
    Ok(task.into())
}

/// Full update; `title` and `project` are required
pub async fn replace_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<TaskPayload>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_id(&id, "Task")?;
    let parsed = req.parse_full()?;

    Ok(Json(apply_update(&state, id, parsed).await?))
}

/// Partial update; absent fields keep their value
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<TaskPayload>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_id(&id, "Task")?;
    let parsed = req.parse()?;

    Ok(Json(apply_update(&state, id, parsed).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "Task")?;

    if !Task::delete(&state.db, id).await? {
        return Err(not_found());
    }

    info!(task_id = %id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Reads the requested status from an update_status body
///
/// Anything other than a string naming a known status (including a missing
/// field) is rejected.
pub fn requested_status(body: &Value) -> ApiResult<TaskStatus> {
    body.get("status")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| {
            let allowed: Vec<&str> = TaskStatus::ALL.iter().map(TaskStatus::as_str).collect();
            ApiError::InvalidStatus(format!("Status must be one of: {}", allowed.join(", ")))
        })
}

/// Reads an update_status body leniently
///
/// A missing, empty or non-JSON body yields `Value::Null`, which
/// [`requested_status`] then rejects like any other invalid status.
pub fn status_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

/// Moves a task to another status
///
/// The task is looked up first; a rejected status changes nothing. Any
/// status may follow any other.
///
/// # Errors
///
/// - `404 Not Found`: unknown task
/// - `400 Bad Request` with `"error": "Estado inválido"`: unknown or missing status
pub async fn update_task_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_id(&id, "Task")?;
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    let status = requested_status(&status_body(&body))?;

    let task = Task::update_status(&state.db, task.id, status)
        .await?
        .ok_or_else(not_found)?;

    info!(task_id = %task.id, status = %task.status, "Task status changed");
    Ok(Json(task.into()))
}
