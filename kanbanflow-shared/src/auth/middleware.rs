/// Bearer token authentication for Axum
///
/// [`authenticate`] turns request headers into an optional [`AuthContext`]:
///
/// - no Authorization header: `Ok(None)`, the request stays anonymous
/// - a valid access token: `Ok(Some(context))`
/// - anything else (wrong scheme, expired, forged, refresh token): `Err`
///
/// Middleware layers call it and insert the context into request
/// extensions, where handlers read it with `Option<Extension<AuthContext>>`.
///
/// # Example
///
/// ```
/// use axum::http::HeaderMap;
/// use kanbanflow_shared::auth::middleware::authenticate;
///
/// let anonymous = authenticate(&HeaderMap::new(), "secret").unwrap();
/// assert!(anonymous.is_none());
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};

/// Identity attached to a request by a verified access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self { user_id: claims.sub }
    }
}

/// Error type for bearer authentication
///
/// Surfaces to clients as 401 through the API error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authorization header present but not `Bearer <token>`
    InvalidFormat(String),

    /// Token failed validation
    InvalidToken(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// Returns the bearer token from the Authorization header, if any
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Validates the request's bearer token, if one was sent
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Option<AuthContext>, AuthError> {
    let Some(token) = bearer_token(headers)? else {
        return Ok(None);
    };

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    Ok(Some(AuthContext::from_claims(&claims)))
}
