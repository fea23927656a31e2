//! Unverified access token inspection.
//!
//! The backend issues JWT access tokens. The client never verifies them (the
//! backend does), but reading the payload lets the CLI show who is logged in
//! and when the token lapses.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::error::CoreError;

/// Claims read from a JWT payload without signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessClaims {
    /// Subject (the username).
    #[serde(default)]
    pub sub: Option<String>,
    /// Issued-at, seconds since the epoch.
    #[serde(default)]
    pub iat: Option<i64>,
    /// Expiry, seconds since the epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl AccessClaims {
    /// Decodes the payload segment of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedToken`] if the token is not three
    /// dot-separated segments or the payload is not base64url JSON.
    pub fn peek(token: &str) -> Result<Self, CoreError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(CoreError::MalformedToken(
                "expected three dot-separated segments".to_string(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| CoreError::MalformedToken(e.to_string()))?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Returns the expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Returns true if the token has expired at `now`.
    ///
    /// Tokens without an `exp` claim never expire from the client's view.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_peek_reads_subject_and_expiry() {
        let token = token_with_payload(r#"{"sub":"luna","iat":1700000000,"exp":1700003600}"#);
        let claims = AccessClaims::peek(&token).unwrap();

        assert_eq!(claims.sub.as_deref(), Some("luna"));
        assert_eq!(claims.exp, Some(1_700_003_600));
        let exp = claims.expires_at().unwrap();
        assert!(claims.is_expired_at(exp));
        assert!(!claims.is_expired_at(exp - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_missing_expiry_never_expires() {
        let token = token_with_payload(r#"{"sub":"luna"}"#);
        let claims = AccessClaims::peek(&token).unwrap();
        assert!(claims.expires_at().is_none());
        assert!(!claims.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_rejects_wrong_segment_count() {
        assert!(matches!(
            AccessClaims::peek("only.two"),
            Err(CoreError::MalformedToken(_))
        ));
        assert!(AccessClaims::peek("a.b.c.d").is_err());
    }

    #[test]
    fn test_rejects_non_json_payload() {
        let token = token_with_payload("not json");
        assert!(matches!(
            AccessClaims::peek(&token),
            Err(CoreError::Serialization(_))
        ));
    }
}
