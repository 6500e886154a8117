/// API route handlers
///
/// - `health`: service metadata and health check
/// - `auth`: registration, login, tokens, profile
/// - `projects`: project CRUD
/// - `tasks`: task CRUD and status transitions

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};

/// Fails with one "required" error per absent field
///
/// Full replacements (PUT) and creates call this; partial updates skip it.
pub(crate) fn require_fields(fields: &[(&str, bool)]) -> ApiResult<()> {
    let missing: Vec<ValidationErrorDetail> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(field, _)| ValidationErrorDetail::new(*field, "This field is required."))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(missing))
    }
}

/// Parses a resource ID from the path; anything unparseable is simply not
/// found
pub(crate) fn parse_id(raw: &str, resource: &str) -> ApiResult<Uuid> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("{} not found", resource)))
}

/// JSON response advertising how long it may be cached
pub(crate) fn cached_json(body: &Value, max_age: Duration) -> Response {
    let mut response = Json(body).into_response();

    if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", max_age.as_secs())) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_fields_lists_every_missing_field() {
        assert!(require_fields(&[("title", true), ("project", true)]).is_ok());

        match require_fields(&[("title", false), ("project", false)]) {
            Err(ApiError::ValidationError(details)) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "project"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Task").unwrap(), id);
        assert!(matches!(parse_id("42", "Task"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_cached_json_sets_max_age() {
        let response = cached_json(&serde_json::json!([]), Duration::from_secs(60));
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "max-age=60"
        );
    }
}
