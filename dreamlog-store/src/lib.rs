// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Dreamlog Store
//!
//! Local state for the Dreamlog client.
//!
//! This crate provides:
//!
//! - **PersistentCredentialStore**: the session, kept in a file or the
//!   system keychain
//! - **SettingsStore**: user preferences with persistence
//! - **Persistence**: file I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use dreamlog_store::{CredentialBackend, PersistentCredentialStore, SettingsStore};
//!
//! let settings = SettingsStore::load_default().await.get().await;
//! let backend = CredentialBackend::from_kind(settings.credential_backend);
//! let credentials = PersistentCredentialStore::load(backend).await;
//! ```

pub mod error;
pub mod persistence;
pub mod session_store;
pub mod settings;

pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_session_path, default_settings_path, ensure_dir, load_json,
    load_json_or_default, remove_file, save_json,
};
pub use session_store::{
    CredentialBackend, KEYCHAIN_ACCOUNT, KEYCHAIN_SERVICE, PersistentCredentialStore,
};
pub use settings::{CredentialBackendKind, DEFAULT_BASE_URL, LogLevel, Settings, SettingsStore};

#[cfg(test)]
mod persistence_tests;
