//! API handlers and shared utilities for the storefront.
//!
//! This module organizes the service's route handlers and provides common
//! functions for validation, bearer token extraction, and error bodies.

pub mod auth;
pub mod categories;
pub mod health;
pub mod messages;
pub mod orders;
pub mod overview;
pub mod products;
pub mod subscribers;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Uniform JSON error body, `{"error": "..."}` on every non-2xx response.
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// `{"success": true}` body used by fire-and-forget endpoints.
#[derive(Serialize, Deserialize, Debug)]
pub struct SuccessBody {
    pub success: bool,
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// The single 401 body shared by every admin route, whatever the cause.
pub(crate) fn unauthorized() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "Unauthorized")
}

pub(crate) fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}

pub(crate) fn not_found_error() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

pub(crate) fn bad_request(message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

/// Fallback for unmatched routes.
pub async fn not_found() -> Response {
    not_found_error()
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` for a missing header, a non-Bearer scheme, or a header
/// value that is not valid ASCII.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Lightweight email sanity check used before persisting data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// RFC 3339 with second precision, the format the storefront UI expects.
pub(crate) fn format_timestamp(timestamp: OffsetDateTime) -> String {
    let truncated = timestamp.replace_nanosecond(0).unwrap_or(timestamp);
    truncated.format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use time::macros::datetime;

    #[test]
    fn bearer_token_extracts_value() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn bearer_token_requires_header() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
    }

    #[test]
    fn valid_email_rejects_missing_at() {
        assert!(!valid_email("user.example.com"));
    }

    #[test]
    fn valid_email_rejects_spaces() {
        assert!(!valid_email("user name@example.com"));
    }

    #[test]
    fn error_body_serializes_single_field() {
        let body = ErrorBody {
            error: "Unauthorized".to_string(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"Unauthorized"}"#);
    }

    #[test]
    fn format_timestamp_is_rfc3339_seconds() {
        let ts = datetime!(2026-01-02 03:04:05.123456 UTC);
        assert_eq!(format_timestamp(ts), "2026-01-02T03:04:05Z");
    }
}
