//! Credential storage seam.
//!
//! The pipeline reads the access token before every send and the refresh
//! token when a session has to be renewed. Writers are login, registration,
//! the refresh leader and logout. Reads are synchronous and never hold a
//! lock across an await.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use dreamlog_core::{LoginResponse, TokenPair, User};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Credential
// ============================================================================

/// Tokens and identity of the current session.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Short-lived bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Long-lived token for the refresh exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Account the tokens belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<User>,
}

impl Credential {
    /// Builds a credential from a login or registration response.
    pub fn from_login(login: &LoginResponse) -> Self {
        Self {
            access_token: Some(login.access_token.clone()),
            refresh_token: Some(login.refresh_token.clone()),
            identity: Some(login.user.clone()),
        }
    }

    /// Replaces both tokens, keeping the identity.
    pub fn apply_tokens(&mut self, tokens: TokenPair) {
        self.access_token = Some(tokens.access_token);
        self.refresh_token = Some(tokens.refresh_token);
    }

    /// Returns true if no token or identity is held.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.identity.is_none()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("identity", &self.identity.as_ref().map(|u| &u.username))
            .finish()
    }
}

// ============================================================================
// Credential Store Trait
// ============================================================================

/// Holds the session credential for an [`crate::ApiClient`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns a copy of the whole credential.
    fn snapshot(&self) -> Credential;

    /// Current access token.
    fn access_token(&self) -> Option<String> {
        self.snapshot().access_token
    }

    /// Current refresh token.
    fn refresh_token(&self) -> Option<String> {
        self.snapshot().refresh_token
    }

    /// Account the session belongs to.
    fn identity(&self) -> Option<User> {
        self.snapshot().identity
    }

    /// Stores a token pair issued by the refresh exchange.
    async fn store_tokens(&self, tokens: TokenPair);

    /// Stores tokens and identity issued by login or registration.
    async fn set_from_login(&self, login: &LoginResponse);

    /// Replaces the identity.
    async fn set_identity(&self, user: User);

    /// Forgets everything.
    async fn clear(&self);
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// Process-local credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Credential>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(credential),
        }
    }

    /// Applies `f` to the credential under the write lock.
    pub fn update(&self, f: impl FnOnce(&mut Credential)) {
        let mut credential = self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut credential);
    }
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("credential", &self.snapshot())
            .finish()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    fn snapshot(&self) -> Credential {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn store_tokens(&self, tokens: TokenPair) {
        debug!("Storing refreshed tokens");
        self.update(|c| c.apply_tokens(tokens));
    }

    async fn set_from_login(&self, login: &LoginResponse) {
        debug!(username = %login.user.username, "Storing session");
        self.update(|c| *c = Credential::from_login(login));
    }

    async fn set_identity(&self, user: User) {
        self.update(|c| c.identity = Some(user));
    }

    async fn clear(&self) {
        debug!("Clearing session");
        self.update(|c| *c = Credential::default());
    }
}

// ============================================================================
// Tests
// ============================================================================
