/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use kanbanflow_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = kanbanflow_api::app::build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    cache::ResponseCache,
    config::Config,
    middleware::identity::{authenticate_layer, require_auth_layer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    pub config: Arc<Config>,

    /// List response cache
    pub cache: Arc<ResponseCache>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            cache: Arc::new(ResponseCache::new()),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// GET                      /
/// GET                      /health
/// GET|POST                 /api/auth/register/
/// GET|POST                 /api/auth/login/
/// POST                     /api/auth/logout/
/// POST                     /api/auth/refresh/
/// GET                      /api/auth/profile/          (token required)
/// GET|POST                 /api/projects/
/// GET|PUT|PATCH|DELETE     /api/projects/:id/
/// GET|POST                 /api/tasks/                 (?project=<id>)
/// GET|PUT|PATCH|DELETE     /api/tasks/:id/
/// PATCH                    /api/tasks/:id/update_status/
/// ```
///
/// Layers, outermost first: CORS, request tracing, bearer authentication.
/// Logout sits outside bearer authentication.
pub fn build_router(state: AppState) -> Router {
    let meta_routes = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check));

    let profile_routes = Router::new()
        .route("/api/auth/profile/", get(routes::auth::profile))
        .route_layer(axum::middleware::from_fn(require_auth_layer));

    let auth_routes = Router::new()
        .route(
            "/api/auth/register/",
            get(routes::auth::register_info).post(routes::auth::register),
        )
        .route(
            "/api/auth/login/",
            get(routes::auth::login_info).post(routes::auth::login),
        )
        .route("/api/auth/refresh/", post(routes::auth::refresh))
        .merge(profile_routes);

    let project_routes = Router::new()
        .route(
            "/api/projects/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/:id/",
            get(routes::projects::get_project)
                .put(routes::projects::replace_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        );

    let task_routes = Router::new()
        .route(
            "/api/tasks/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/tasks/:id/",
            get(routes::tasks::get_task)
                .put(routes::tasks::replace_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/api/tasks/:id/update_status/",
            patch(routes::tasks::update_task_status),
        );

    // Logout succeeds whatever token the client still holds
    let logout_routes = Router::new().route("/api/auth/logout/", post(routes::auth::logout));

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(meta_routes)
        .merge(auth_routes)
        .merge(project_routes)
        .merge(task_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            authenticate_layer,
        ))
        .merge(logout_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
