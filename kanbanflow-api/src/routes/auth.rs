/// Authentication endpoints
///
/// # Endpoints
///
/// - `GET|POST /api/auth/register/` - describe / create an account
/// - `GET|POST /api/auth/login/` - describe / exchange credentials for tokens
/// - `POST /api/auth/logout/` - always succeeds
/// - `POST /api/auth/refresh/` - new access token from a refresh token
/// - `GET /api/auth/profile/` - the caller's account (token required)
///
/// Tokens are stateless, so logout has nothing to revoke; clients drop
/// their tokens.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use kanbanflow_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 150, message = "Username must be 1 to 150 characters")
    )]
    pub username: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 8, message = "Password must be at least 8 characters")
    )]
    pub password: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 150, message = "First name must be at most 150 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 150, message = "Last name must be at most 150 characters"))]
    pub last_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required(message = "This field is required."))]
    pub username: Option<String>,

    #[validate(required(message = "This field is required."))]
    pub password: Option<String>,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(required(message = "This field is required."))]
    pub refresh_token: Option<String>,
}

/// Public user fields
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            date_joined: user.created_at,
            last_login: user.last_login_at,
        }
    }
}

/// Register and login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,

    pub user: UserResponse,

    /// Access token (24h)
    pub token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// What a GET on a POST-only auth endpoint returns
#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub message: String,
    pub method: String,
    pub fields: Vec<String>,
}

impl EndpointInfo {
    fn post(message: &str, fields: &[&str]) -> Self {
        Self {
            message: message.to_string(),
            method: "POST".to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

fn auth_response(state: &AppState, message: &str, user: User) -> ApiResult<AuthResponse> {
    let (token, refresh_token) = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    Ok(AuthResponse {
        message: message.to_string(),
        user: user.into(),
        token,
        refresh_token,
    })
}

pub async fn register_info() -> Json<EndpointInfo> {
    Json(EndpointInfo::post(
        "Endpoint de registro",
        &["username", "password", "email", "first_name", "last_name"],
    ))
}

/// Register a new user
///
/// ```text
/// POST /api/auth/register/
///
/// { "username": "ana", "password": "s3cret-pass", "email": "ana@example.com" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing or invalid fields, username taken
pub async fn register(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.email = req.email.filter(|email| !email.trim().is_empty());
    req.validate()?;

    let (Some(username), Some(plain)) = (req.username, req.password) else {
        return Err(ApiError::BadRequest("Missing credentials".to_string()));
    };

    let user = User::create(
        &state.db,
        CreateUser {
            username,
            email: req.email.unwrap_or_default(),
            first_name: req.first_name.unwrap_or_default(),
            last_name: req.last_name.unwrap_or_default(),
            password_hash: password::hash_password(&plain)?,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let body = auth_response(&state, "Usuario registrado exitosamente", user)?;
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn login_info() -> Json<EndpointInfo> {
    Json(EndpointInfo::post("Endpoint de login", &["username", "password"]))
}

/// Exchanges username and password for tokens
///
/// # Errors
///
/// - `400 Bad Request`: missing fields, or `non_field_errors` for bad
///   credentials
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let (Some(username), Some(plain)) = (req.username, req.password) else {
        return Err(ApiError::BadRequest("Missing credentials".to_string()));
    };

    let invalid = || ApiError::field("non_field_errors", "Credenciales inválidas");

    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&plain, &user.password_hash)? {
        tracing::debug!(username = %username, "Login rejected");
        return Err(invalid());
    }

    User::update_last_login(&state.db, user.id).await?;
    let user = User::find_by_id(&state.db, user.id).await?.unwrap_or(user);

    Ok(Json(auth_response(&state, "Inicio de sesión exitoso", user)?))
}

/// Always reports success
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Sesión cerrada exitosamente".to_string(),
    })
}

/// Exchanges a refresh token for a new access token
///
/// # Errors
///
/// - `400 Bad Request`: `refresh_token` missing
/// - `401 Unauthorized`: invalid, expired, or not a refresh token
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    req.validate()?;

    let refresh_token = req.refresh_token.unwrap_or_default();
    let token = jwt::refresh_access_token(&refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { token }))
}

/// The authenticated caller's account
///
/// # Errors
///
/// - `401 Unauthorized`: no token, or the token's user was deleted
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    Ok(Json(user.into()))
}
