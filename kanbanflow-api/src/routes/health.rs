/// Service metadata and health check endpoints
///
/// # Endpoints
///
/// - `GET /` - service name, version and API entry points
/// - `GET /health` - liveness plus database connectivity
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use kanbanflow_shared::db::pool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root endpoint response
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,

    pub version: String,

    pub message: String,

    /// Resource name -> base path
    pub endpoints: BTreeMap<String, String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    pub version: String,

    /// "connected" or "disconnected"
    pub database: String,
}

/// Describes the service for front-ends and humans
pub async fn root() -> Json<ServiceInfo> {
    let endpoints = [
        ("auth", "/api/auth/"),
        ("projects", "/api/projects/"),
        ("tasks", "/api/tasks/"),
        ("health", "/health"),
    ]
    .into_iter()
    .map(|(name, path)| (name.to_string(), path.to_string()))
    .collect();

    Json(ServiceInfo {
        name: "KanbanFlow".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "KanbanFlow API is running".to_string(),
        endpoints,
    })
}

/// Health check handler
///
/// Always 200; a lost database shows up as `"status": "degraded"`.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = pool::health_check(&state.db).await.is_ok();

    Ok(Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    }))
}
