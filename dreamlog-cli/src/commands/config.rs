//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use dreamlog_store::{
    CredentialBackendKind, Settings, SettingsStore, default_config_dir, default_session_path,
};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Set the backend API root.
    SetBaseUrl {
        /// Absolute http(s) URL, e.g. `https://dreams.example.com/api`.
        url: String,
    },

    /// Choose where the session is kept.
    SetBackend {
        /// Session storage.
        #[arg(value_enum)]
        backend: BackendChoice,
    },

    /// Set analysis polling.
    SetPolling {
        /// Pause between status reads, in milliseconds.
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Status reads before giving up.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_attempts: Option<u32>,
    },

    /// Reset to defaults.
    Reset,
}

/// Session storage accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    /// JSON file in the config directory.
    File,
    /// System keychain.
    Keychain,
}

impl From<BackendChoice> for CredentialBackendKind {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::File => CredentialBackendKind::File,
            BackendChoice::Keychain => CredentialBackendKind::Keychain,
        }
    }
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli, store).await,
        ConfigAction::Path => show_paths(cli, store),
        ConfigAction::SetBaseUrl { url } => set_base_url(url, store).await,
        ConfigAction::SetBackend { backend } => set_backend(*backend, store).await,
        ConfigAction::SetPolling {
            interval_ms,
            max_attempts,
        } => set_polling(*interval_ms, *max_attempts, store).await,
        ConfigAction::Reset => reset_config(store).await,
    }
}

async fn show_config(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let settings = store.get().await;

    match cli.format {
        OutputFormat::Text => {
            println!("Dreamlog Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Base URL:         {}", settings.base_url);
            if let Some(overridden) = &cli.base_url {
                println!("  (overridden by --base-url: {overridden})");
            }
            println!("Request timeout:  {}s", settings.timeout_secs);
            println!("Poll interval:    {} ms", settings.poll_interval_ms);
            println!("Poll attempts:    {}", settings.poll_max_attempts);
            println!("Session storage:  {}", settings.credential_backend);
            println!("Log level:        {}", settings.log_level);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&settings)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = store.path();
    let session_path = default_session_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
            println!("Session file:  {}", session_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
                "session_file": session_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_base_url(url: &str, store: &SettingsStore) -> Result<()> {
    Settings::validate_base_url(url)?;
    let url = url.trim_end_matches('/').to_string();

    store.update(|s| s.base_url.clone_from(&url)).await;
    store.save().await?;

    info!(base_url = %url, "Base URL updated");
    println!("Base URL set to: {url}");

    Ok(())
}

async fn set_backend(choice: BackendChoice, store: &SettingsStore) -> Result<()> {
    let kind = CredentialBackendKind::from(choice);

    store.update(|s| s.credential_backend = kind).await;
    store.save().await?;

    info!(backend = %kind, "Session storage updated");
    println!("Session storage set to: {kind}");
    println!("Sign in again to store a session there.");

    Ok(())
}

async fn set_polling(
    interval_ms: Option<u64>,
    max_attempts: Option<u32>,
    store: &SettingsStore,
) -> Result<()> {
    if interval_ms.is_none() && max_attempts.is_none() {
        anyhow::bail!("Nothing to change. Pass --interval-ms and/or --max-attempts");
    }

    store
        .update(|s| {
            if let Some(ms) = interval_ms {
                s.poll_interval_ms = ms;
            }
            if let Some(max) = max_attempts {
                s.poll_max_attempts = max;
            }
        })
        .await;
    store.save().await?;

    let settings = store.get().await;
    info!(
        interval_ms = settings.poll_interval_ms,
        max_attempts = settings.poll_max_attempts,
        "Polling updated"
    );
    println!(
        "Polling every {} ms, up to {} times",
        settings.poll_interval_ms, settings.poll_max_attempts
    );

    Ok(())
}

async fn reset_config(store: &SettingsStore) -> Result<()> {
    let path = store.path();

    if path.exists() {
        tokio::fs::remove_file(path).await?;
        store.reset().await;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_base_url_persists_trimmed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone());

        set_base_url("https://dreams.example.com/api/", &store).await.unwrap();

        let reloaded = SettingsStore::load(path).await.get().await;
        assert_eq!(reloaded.base_url, "https://dreams.example.com/api");
    }

    #[tokio::test]
    async fn test_set_base_url_rejects_relative() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone());

        assert!(set_base_url("dreams.example.com", &store).await.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_set_polling_requires_a_value() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::new(temp_dir.path().join("settings.json"));
        assert!(set_polling(None, None, &store).await.is_err());

        set_polling(Some(500), None, &store).await.unwrap();
        let settings = store.get().await;
        assert_eq!(settings.poll_interval_ms, 500);
        assert_eq!(settings.poll_max_attempts, 30);
    }

    #[tokio::test]
    async fn test_reset_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone());
        set_backend(BackendChoice::Keychain, &store).await.unwrap();
        assert!(path.exists());

        reset_config(&store).await.unwrap();
        assert!(!path.exists());
        assert_eq!(store.get().await, Settings::default());
    }
}
