//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use dreamlog_core::{AccessClaims, User};
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for `whoami`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_datetime_opt")]
    pub token_expires_at: Option<DateTime<Utc>>,
    pub backend: String,
}

impl SessionOutput {
    /// Builds the output from the stored identity and access token.
    ///
    /// An unreadable token simply has no expiry.
    pub fn new(user: Option<User>, access_token: Option<&str>, backend: String) -> Self {
        let token_expires_at = access_token
            .and_then(|token| AccessClaims::peek(token).ok())
            .and_then(|claims| claims.expires_at());
        Self {
            logged_in: access_token.is_some(),
            user,
            token_expires_at,
            backend,
        }
    }
}

// ============================================================================
// Serialization helpers
// ============================================================================

#[allow(clippy::ref_option)]
fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty() {
        let formatter = JsonFormatter::new(true);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_format_compact() {
        let formatter = JsonFormatter::new(false);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_session_output_without_token() {
        let output = SessionOutput::new(None, None, "file".to_string());
        let json = JsonFormatter::new(false).format(&output).unwrap();
        assert_eq!(json, r#"{"loggedIn":false,"backend":"file"}"#);
    }

    #[test]
    fn test_session_output_opaque_token_has_no_expiry() {
        let output = SessionOutput::new(None, Some("opaque"), "keychain".to_string());
        assert!(output.logged_in);
        assert!(output.token_expires_at.is_none());
    }
}
