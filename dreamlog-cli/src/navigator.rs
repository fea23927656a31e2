//! Navigator for a terminal: redirects become hints on stderr.

use dreamlog_client::Navigator;
use tracing::debug;

/// Prints where the user should go next instead of navigating.
#[derive(Debug, Clone)]
pub struct TerminalNavigator {
    quiet: bool,
    location: String,
}

impl TerminalNavigator {
    /// Creates a navigator whose location is the current command line.
    pub fn new(quiet: bool) -> Self {
        let location = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
        Self { quiet, location }
    }
}

impl Navigator for TerminalNavigator {
    fn redirect_to_login(&self, return_path: Option<&str>) {
        debug!(return_path = ?return_path, "Session ended");
        if self.quiet {
            return;
        }
        eprintln!("Session expired. Run `dreamlog login <username>` to sign in again.");
        if let Some(path) = return_path.filter(|p| !p.is_empty()) {
            eprintln!("Then retry: dreamlog {path}");
        }
    }

    fn redirect_to_default_authenticated(&self) {
        debug!("Access denied");
        if !self.quiet {
            eprintln!("Access denied for this account.");
        }
    }

    fn current_location(&self) -> Option<String> {
        Some(self.location.clone())
    }
}
