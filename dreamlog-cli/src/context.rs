//! Per-invocation wiring: settings, stored session and API client.

use anyhow::{Context as _, Result};
use dreamlog_client::{ApiClient, AuthSession, CredentialStore, DreamApi};
use dreamlog_store::{CredentialBackend, PersistentCredentialStore, Settings, SettingsStore};
use std::sync::Arc;
use tracing::debug;

use crate::Cli;
use crate::navigator::TerminalNavigator;

/// Everything a command needs to talk to the backend.
pub struct AppContext {
    pub settings: Settings,
    pub client: ApiClient,
}

impl AppContext {
    /// Builds the context from the saved settings and the global flags.
    ///
    /// `--base-url` wins over the configured URL.
    pub async fn build(cli: &Cli, store: &SettingsStore) -> Result<Self> {
        let mut settings = store.get().await;
        if let Some(base_url) = &cli.base_url {
            settings.base_url.clone_from(base_url);
        }

        let backend = CredentialBackend::from_kind(settings.credential_backend);
        debug!(backend = %backend, base_url = %settings.base_url, "Building client");

        let credentials: Arc<dyn CredentialStore> =
            Arc::new(PersistentCredentialStore::load(backend).await);
        let navigator = Arc::new(TerminalNavigator::new(cli.quiet));

        let client = ApiClient::builder(settings.base_url.clone())
            .timeout(settings.request_timeout())
            .credentials(credentials)
            .navigator(navigator)
            .build()
            .with_context(|| format!("invalid base URL: {}", settings.base_url))?;

        Ok(Self { settings, client })
    }

    /// Session operations over this context's client.
    pub fn session(&self) -> AuthSession {
        AuthSession::new(self.client.clone())
    }

    /// Dream endpoints over this context's client.
    pub fn dreams(&self) -> DreamApi {
        DreamApi::new(self.client.clone())
    }
}
