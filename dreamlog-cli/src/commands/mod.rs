//! CLI command implementations.

pub mod analyze;
pub mod auth;
pub mod config;
pub mod dreams;

use dreamlog_client::ApiError;

/// Wraps `error` with the text a user should see.
///
/// The server's message wins over `fallback`; the `ApiError` stays in the
/// chain so the exit code can still be derived from it.
pub(crate) fn user_facing(error: ApiError, fallback: &str) -> anyhow::Error {
    let message = error.message_or(fallback);
    anyhow::Error::new(error).context(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreamlog_client::GENERIC_FAILURE_MESSAGE;

    #[test]
    fn test_user_facing_prefers_server_message() {
        let error = user_facing(
            ApiError::Forbidden {
                message: Some("Not your dream".to_string()),
            },
            GENERIC_FAILURE_MESSAGE,
        );
        assert_eq!(error.to_string(), "Not your dream");
        assert!(matches!(
            error.downcast_ref::<ApiError>(),
            Some(ApiError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_user_facing_fallback() {
        let error = user_facing(ApiError::AuthExpired { message: None }, "Login failed");
        assert_eq!(error.to_string(), "Login failed");
    }
}
