//! Request extractors whose rejections use the JSON error body.
//!
//! Drop-in replacements for `axum::Json` and `axum::extract::Path`: a body
//! that fails to parse or a non-numeric id becomes `AppError::BadRequest`
//! instead of axum's plain-text rejection.

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::extract::rejection::{JsonRejection, PathRejection};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Read an integer from a loosely-typed JSON field.
///
/// Accepts JSON integers and, when `allow_strings` is set, strings holding
/// one (form posts often send `"3"`). Floats, booleans and out-of-range
/// values yield `None`.
#[must_use]
pub fn json_int(value: &serde_json::Value, allow_strings: bool) -> Option<i32> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        serde_json::Value::String(s) if allow_strings => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_int() {
        assert_eq!(json_int(&json!(3), false), Some(3));
        assert_eq!(json_int(&json!(-1), false), Some(-1));
        assert_eq!(json_int(&json!(2.5), false), None);
        assert_eq!(json_int(&json!("4"), false), None);
        assert_eq!(json_int(&json!("4"), true), Some(4));
        assert_eq!(json_int(&json!(true), true), None);
        assert_eq!(json_int(&json!(10_000_000_000_i64), false), None);
    }
}
