/// Request body helpers
///
/// [`ApiJson`] behaves like `axum::Json` but reports malformed or
/// mistyped bodies through [`ApiError`], so clients always get the same
/// 400 error shape. [`deserialize_some`] lets optional fields distinguish
/// "absent" from an explicit `null`; [`deserialize_trimmed`] strips
/// surrounding whitespace so blank text fails length validation.

use axum::extract::{rejection::JsonRejection, FromRequest};
use serde::{Deserialize, Deserializer};

use crate::error::{ApiError, ValidationErrorDetail};

/// JSON body extractor with API-shaped rejections
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "non_field_errors",
            rejection.body_text(),
        )])
    }
}

/// Deserializes a present field (including `null`) as `Some`
///
/// Combine with `#[serde(default)]` on an `Option<Option<T>>` field:
/// absent -> `None`, `null` -> `Some(None)`, value -> `Some(Some(v))`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Deserializes an optional string with surrounding whitespace removed
pub fn deserialize_trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()))
}
