//! Request and response interceptors.
//!
//! The request side stamps credentials onto outbound calls. The response side
//! decides what a failed response means for the pipeline; the side effects
//! (refresh, redirect, logging) are carried out by [`crate::ApiClient`].

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::request::{ApiRequest, Attempt};

// ============================================================================
// Request Interceptor
// ============================================================================

/// Returns `request` with the current access token attached.
///
/// Without a token the request goes out unchanged and unauthenticated.
pub fn authorize(request: &ApiRequest, access_token: Option<&str>) -> ApiRequest {
    match access_token {
        Some(token) if !token.is_empty() => request.with_bearer(token),
        _ => request.clone(),
    }
}

// ============================================================================
// Response Interceptor
// ============================================================================

/// What the pipeline does with a failed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Refresh the session, then replay the request once.
    RefreshAndReplay,
    /// Send the user to the default landing route, then reject.
    RedirectAndReject,
    /// Reject with the original error.
    Reject,
}

/// Classifies a failed response.
pub fn disposition(status: StatusCode, request: &ApiRequest, attempt: Attempt) -> Disposition {
    match status {
        StatusCode::UNAUTHORIZED if request.is_session_endpoint() => Disposition::Reject,
        StatusCode::UNAUTHORIZED if attempt == Attempt::Initial => Disposition::RefreshAndReplay,
        StatusCode::FORBIDDEN => Disposition::RedirectAndReject,
        _ => Disposition::Reject,
    }
}

/// Error body served by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Extracts the `message` field from an error body.
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

/// Unwraps the `{code, message, data}` envelope of a success body.
///
/// Bodies without a non-null `data` field are returned as they are.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            Some(data) => {
                map.insert("data".to_string(), data);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================
