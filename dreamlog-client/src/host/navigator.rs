//! Navigation sink.
//!
//! The pipeline never decides how a redirect looks; it only tells the host
//! where the user should go. A UI would change routes, the CLI prints a hint.

use tracing::info;

/// Receives routing instructions from the pipeline.
pub trait Navigator: Send + Sync {
    /// The session is gone; send the user to login, optionally returning to
    /// `return_path` afterwards.
    fn redirect_to_login(&self, return_path: Option<&str>);

    /// Access was denied; send the user to the default authenticated route.
    fn redirect_to_default_authenticated(&self);

    /// Where the user currently is, used as the login return path.
    fn current_location(&self) -> Option<String> {
        None
    }
}

/// Navigator that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_login(&self, return_path: Option<&str>) {
        info!(return_path = ?return_path, "Login required");
    }

    fn redirect_to_default_authenticated(&self) {
        info!("Access denied, returning to default route");
    }
}
