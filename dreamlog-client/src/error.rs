//! API error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Fallback shown when a failed response carries no server message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed, please try again later";

/// Fallback when a job reports failure without a reason.
pub const JOB_FAILED_MESSAGE: &str = "AI analysis generation failed";

/// Shown when polling gives up before the job settles.
pub const POLL_TIMEOUT_MESSAGE: &str = "AI analysis timed out, refresh later to check the result";

// ============================================================================
// API Error
// ============================================================================

/// Error type for calls made through the request pipeline.
///
/// Server-supplied messages are kept verbatim so callers can branch on the
/// status code and show the backend's own wording.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connect failure, timeout, reset).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered 401.
    #[error("Authentication expired: {}", .message.as_deref().unwrap_or("no message"))]
    AuthExpired {
        /// Server message, if any.
        message: Option<String>,
    },

    /// The refresh exchange failed; the session has been ended.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The backend answered 403.
    #[error("Access denied: {}", .message.as_deref().unwrap_or("no message"))]
    Forbidden {
        /// Server message, if any.
        message: Option<String>,
    },

    /// A polled job reported a terminal failure.
    #[error("{0}")]
    JobFailed(String),

    /// Polling ran out of attempts before the job settled.
    #[error("AI analysis timed out after {attempts} attempts")]
    PollTimeout {
        /// Number of reads performed.
        attempts: u32,
    },

    /// Polling was cancelled by the caller.
    #[error("Polling cancelled")]
    Cancelled,

    /// Any other non-2xx response.
    #[error("API error {status}: {}", .message.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE))]
    Api {
        /// HTTP status.
        status: StatusCode,
        /// Server message, if any.
        message: Option<String>,
    },

    /// A 2xx body did not have the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The base URL or request path could not form a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be set up; no request was attempted.
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// Builds the error for a failed response.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::AuthExpired { message },
            StatusCode::FORBIDDEN => Self::Forbidden { message },
            _ => Self::Api { status, message },
        }
    }

    /// Returns the HTTP status behind this error, if there was a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(e) => e.status(),
            Self::AuthExpired { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the message supplied by the backend, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::AuthExpired { message }
            | Self::Forbidden { message }
            | Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Returns true for a 401.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired { .. })
    }

    /// Returns the message to show a user.
    ///
    /// Prefers the server's message and falls back to a generic one.
    pub fn user_message(&self) -> String {
        self.message_or(GENERIC_FAILURE_MESSAGE)
    }

    /// Like [`ApiError::user_message`] with a caller-chosen fallback.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            Self::JobFailed(message) => message.clone(),
            Self::PollTimeout { .. } => POLL_TIMEOUT_MESSAGE.to_string(),
            Self::Cancelled => self.to_string(),
            _ => self
                .server_message()
                .filter(|m| !m.is_empty())
                .unwrap_or(fallback)
                .to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
