//! Request descriptors.
//!
//! An [`ApiRequest`] is an immutable description of a call: it can be sent,
//! stamped with credentials, and replayed without re-running caller code.
//! The retry marker is an [`Attempt`] carried next to it by the pipeline.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use tracing::warn;

use crate::error::ApiError;

/// Login endpoint.
pub const AUTH_LOGIN_PATH: &str = "/auth/login";
/// Registration endpoint.
pub const AUTH_REGISTER_PATH: &str = "/auth/register";
/// Refresh exchange endpoint.
pub const AUTH_REFRESH_PATH: &str = "/auth/refresh";

/// Calls that establish or renew authentication. A 401 on these is final.
const SESSION_ENDPOINTS: [&str; 3] = [AUTH_LOGIN_PATH, AUTH_REGISTER_PATH, AUTH_REFRESH_PATH];

// ============================================================================
// Attempt
// ============================================================================

/// Which send of a request this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// First send.
    Initial,
    /// The single automatic resend after a token refresh.
    Replay,
}

// ============================================================================
// Api Request
// ============================================================================

/// A call to the backend, relative to the client's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Creates a request with no query, headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Creates a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if `body` cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Sets a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns a copy whose `Authorization` header carries `token`.
    ///
    /// A token that cannot be a header value leaves the copy unauthenticated.
    #[must_use]
    pub fn with_bearer(&self, token: &str) -> Self {
        let mut stamped = self.clone();
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                stamped.headers.insert(AUTHORIZATION, value);
            }
            Err(e) => {
                warn!(error = %e, "Access token is not a valid header value");
                stamped.headers.remove(AUTHORIZATION);
            }
        }
        stamped
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Headers set on this request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// JSON body, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Returns the bearer token currently attached, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    /// Returns true for login, registration and refresh calls.
    pub fn is_session_endpoint(&self) -> bool {
        SESSION_ENDPOINTS
            .iter()
            .any(|endpoint| self.path.contains(endpoint))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_bearer_does_not_touch_original() {
        let original = ApiRequest::get("/dreams/1");
        let stamped = original.with_bearer("abc");

        assert_eq!(stamped.bearer_token(), Some("abc"));
        assert_eq!(original.bearer_token(), None);
    }

    #[test]
    fn test_with_bearer_overwrites() {
        let request = ApiRequest::get("/dreams").with_bearer("old").with_bearer("new");
        assert_eq!(request.bearer_token(), Some("new"));
        assert_eq!(request.headers().get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn test_invalid_token_is_dropped() {
        let request = ApiRequest::get("/dreams").with_bearer("ok").with_bearer("bad\ntoken");
        assert_eq!(request.bearer_token(), None);
    }

    #[test]
    fn test_session_endpoints() {
        assert!(ApiRequest::post(AUTH_LOGIN_PATH).is_session_endpoint());
        assert!(ApiRequest::post(AUTH_REGISTER_PATH).is_session_endpoint());
        assert!(ApiRequest::post(AUTH_REFRESH_PATH).is_session_endpoint());
        assert!(!ApiRequest::post("/auth/logout").is_session_endpoint());
        assert!(!ApiRequest::get("/auth/me").is_session_endpoint());
        assert!(!ApiRequest::get("/dreams/1").is_session_endpoint());
    }

    #[test]
    fn test_query_and_body() {
        #[derive(Serialize)]
        struct Body {
            title: &'static str,
        }

        let request = ApiRequest::put("/dreams/3")
            .with_query("page", 2)
            .with_query("keyword", "sea")
            .with_json(&Body { title: "t" })
            .unwrap();

        assert_eq!(request.method(), &Method::PUT);
        assert_eq!(
            request.query(),
            &[
                ("page".to_string(), "2".to_string()),
                ("keyword".to_string(), "sea".to_string())
            ]
        );
        assert_eq!(request.body(), Some(&serde_json::json!({"title": "t"})));
    }
}
