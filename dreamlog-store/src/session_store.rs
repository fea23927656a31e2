//! Credential store that survives restarts.
//!
//! The credential is held in memory for the pipeline and written through to
//! a backend after every change:
//! - `File`: JSON at the config directory, written atomically with 0600
//! - `Keychain`: one entry in the system keychain
//!
//! Updates are serialized so the backend always ends on the last in-memory
//! state. A failed write is logged; the in-memory session stays authoritative.

use async_trait::async_trait;
use dreamlog_client::{Credential, CredentialStore, MemoryCredentialStore};
use dreamlog_core::{LoginResponse, TokenPair, User};
use keyring::Entry;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persistence::{default_session_path, load_json, remove_file, save_json};
use crate::settings::CredentialBackendKind;

/// Keychain service name.
pub const KEYCHAIN_SERVICE: &str = "dreamlog";

/// Keychain account holding the session.
pub const KEYCHAIN_ACCOUNT: &str = "session";

// ============================================================================
// Backend
// ============================================================================

/// Where a [`PersistentCredentialStore`] writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialBackend {
    /// JSON file at this path.
    File(PathBuf),
    /// System keychain entry.
    Keychain,
}

impl CredentialBackend {
    /// Backend for `kind` at its default location.
    pub fn from_kind(kind: CredentialBackendKind) -> Self {
        match kind {
            CredentialBackendKind::File => Self::File(default_session_path()),
            CredentialBackendKind::Keychain => Self::Keychain,
        }
    }

    async fn read(&self) -> Result<Option<Credential>, StoreError> {
        match self {
            Self::File(path) => match load_json(path).await {
                Ok(credential) => Ok(Some(credential)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            },
            Self::Keychain => match keychain_entry()?.get_password() {
                Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(e.into()),
            },
        }
    }

    async fn write(&self, credential: &Credential) -> Result<(), StoreError> {
        if credential.is_empty() {
            return self.erase().await;
        }
        match self {
            Self::File(path) => save_json(path, credential).await,
            Self::Keychain => {
                let json = serde_json::to_string(credential)?;
                keychain_entry()?.set_password(&json)?;
                Ok(())
            }
        }
    }

    async fn erase(&self) -> Result<(), StoreError> {
        match self {
            Self::File(path) => remove_file(path).await,
            Self::Keychain => match keychain_entry()?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(e.into()),
            },
        }
    }
}

impl std::fmt::Display for CredentialBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "file ({})", path.display()),
            Self::Keychain => write!(f, "keychain ({KEYCHAIN_SERVICE}/{KEYCHAIN_ACCOUNT})"),
        }
    }
}

fn keychain_entry() -> Result<Entry, StoreError> {
    Ok(Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)?)
}

// ============================================================================
// Persistent Store
// ============================================================================

/// [`CredentialStore`] that writes through to a [`CredentialBackend`].
#[derive(Debug)]
pub struct PersistentCredentialStore {
    memory: MemoryCredentialStore,
    backend: CredentialBackend,
    /// Held across an in-memory update and its backend write.
    write_lock: Mutex<()>,
}

impl PersistentCredentialStore {
    /// Loads the stored session from `backend`.
    ///
    /// A missing or unreadable record yields an empty session.
    pub async fn load(backend: CredentialBackend) -> Self {
        let credential = match backend.read().await {
            Ok(Some(credential)) => {
                debug!(backend = %backend, "Session restored");
                credential
            }
            Ok(None) => {
                debug!(backend = %backend, "No stored session");
                Credential::default()
            }
            Err(e) => {
                warn!(backend = %backend, error = %e, "Stored session unreadable, starting signed out");
                Credential::default()
            }
        };

        Self {
            memory: MemoryCredentialStore::with_credential(credential),
            backend,
            write_lock: Mutex::new(()),
        }
    }

    /// The backend this store writes to.
    pub fn backend(&self) -> &CredentialBackend {
        &self.backend
    }

    /// Caller must hold `write_lock`.
    async fn persist(&self) {
        let credential = self.memory.snapshot();
        if let Err(e) = self.backend.write(&credential).await {
            warn!(backend = %self.backend, error = %e, "Failed to persist session");
        }
    }
}

#[async_trait]
impl CredentialStore for PersistentCredentialStore {
    fn snapshot(&self) -> Credential {
        self.memory.snapshot()
    }

    async fn store_tokens(&self, tokens: TokenPair) {
        let _guard = self.write_lock.lock().await;
        self.memory.store_tokens(tokens).await;
        self.persist().await;
    }

    async fn set_from_login(&self, login: &LoginResponse) {
        let _guard = self.write_lock.lock().await;
        self.memory.set_from_login(login).await;
        self.persist().await;
    }

    async fn set_identity(&self, user: User) {
        let _guard = self.write_lock.lock().await;
        self.memory.set_identity(user).await;
        self.persist().await;
    }

    async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        self.memory.clear().await;
        self.persist().await;
    }
}
