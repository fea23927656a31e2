//! Persistence tests for settings and the file credential backend.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use dreamlog_client::CredentialStore;
use dreamlog_core::{LoginResponse, Role, TokenPair, User, UserStatus};

use crate::persistence::{ensure_dir, load_json, load_json_or_default, save_json};
use crate::session_store::{CredentialBackend, PersistentCredentialStore};
use crate::settings::{CredentialBackendKind, Settings, SettingsStore};

fn login() -> LoginResponse {
    LoginResponse {
        access_token: "a1".to_string(),
        refresh_token: "r1".to_string(),
        token_type: Some("Bearer".to_string()),
        expires_in: Some(86_400),
        user: User {
            id: 9,
            username: "luna".to_string(),
            email: "luna@example.com".to_string(),
            nickname: None,
            avatar_url: None,
            role: Role::User,
            status: UserStatus::Active,
            created_at: None,
            updated_at: None,
        },
    }
}

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("test.json");

    save_json(&nested_path, &serde_json::json!({"key": "value"}))
        .await
        .unwrap();

    assert!(nested_path.exists());
    assert!(!nested_path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let file_path = PathBuf::from("/nonexistent/path/settings.json");

    let result: Result<Settings, _> = load_json(&file_path).await;
    assert!(result.unwrap_err().is_not_found());

    let settings: Settings = load_json_or_default(&file_path).await;
    assert_eq!(settings, Settings::default());
}

#[tokio::test]
async fn test_ensure_dir_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let dir_path = temp_dir.path().join("test_dir");

    ensure_dir(&dir_path).await.unwrap();
    ensure_dir(&dir_path).await.unwrap();

    assert!(dir_path.is_dir());
}

// ============================================================================
// Settings Store Tests
// ============================================================================

#[tokio::test]
async fn test_settings_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    let store = SettingsStore::load(path.clone()).await;
    assert_eq!(store.get().await, Settings::default());

    store
        .update(|s| {
            s.base_url = "https://dreams.example.com/api".to_string();
            s.poll_max_attempts = 5;
            s.credential_backend = CredentialBackendKind::Keychain;
        })
        .await;
    store.save().await.unwrap();

    let reloaded = SettingsStore::load(path).await.get().await;
    assert_eq!(reloaded.base_url, "https://dreams.example.com/api");
    assert_eq!(reloaded.poll_options().max_attempts, 5);
    assert_eq!(reloaded.credential_backend, CredentialBackendKind::Keychain);
}

#[tokio::test]
async fn test_corrupt_settings_fall_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let store = SettingsStore::load(path).await;
    assert_eq!(store.get().await, Settings::default());
}

#[tokio::test]
async fn test_settings_reset() {
    let temp_dir = TempDir::new().unwrap();
    let store = SettingsStore::new(temp_dir.path().join("settings.json"));

    store.update(|s| s.timeout_secs = 5).await;
    store.reset().await;

    assert_eq!(store.get().await.timeout_secs, 30);
}

// ============================================================================
// File Credential Backend Tests
// ============================================================================

#[tokio::test]
async fn test_session_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let backend = CredentialBackend::File(temp_dir.path().join("session.json"));

    let store = PersistentCredentialStore::load(backend.clone()).await;
    store.set_from_login(&login()).await;
    store
        .store_tokens(TokenPair {
            access_token: "a2".to_string(),
            refresh_token: "r2".to_string(),
        })
        .await;

    let restored = PersistentCredentialStore::load(backend).await;
    assert_eq!(restored.access_token().as_deref(), Some("a2"));
    assert_eq!(restored.refresh_token().as_deref(), Some("r2"));
    assert_eq!(restored.identity().map(|u| u.id), Some(9));
}

#[tokio::test]
async fn test_clear_removes_session_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");
    let store = PersistentCredentialStore::load(CredentialBackend::File(path.clone())).await;

    store.set_from_login(&login()).await;
    assert!(path.exists());

    store.clear().await;
    assert!(!path.exists());
    assert!(store.snapshot().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_leave_file_matching_memory() {
    let temp_dir = TempDir::new().unwrap();
    let backend = CredentialBackend::File(temp_dir.path().join("session.json"));

    for round in 0..20 {
        let store = Arc::new(PersistentCredentialStore::load(backend.clone()).await);
        store.set_from_login(&login()).await;

        let refresh = tokio::spawn({
            let store = Arc::clone(&store);
            async move {
                store
                    .store_tokens(TokenPair {
                        access_token: format!("a{round}"),
                        refresh_token: format!("r{round}"),
                    })
                    .await;
            }
        });
        let logout = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.clear().await }
        });
        refresh.await.unwrap();
        logout.await.unwrap();

        let restored = PersistentCredentialStore::load(backend.clone()).await;
        assert!(
            restored.snapshot() == store.snapshot(),
            "stored session diverged from memory in round {round}"
        );
    }
}

#[tokio::test]
async fn test_corrupt_session_starts_signed_out() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");
    tokio::fs::write(&path, "garbage").await.unwrap();

    let store = PersistentCredentialStore::load(CredentialBackend::File(path)).await;
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_write_failure_keeps_memory_session() {
    let temp_dir = TempDir::new().unwrap();
    // A directory where the file should be makes every write fail.
    let path = temp_dir.path().join("session.json");
    std::fs::create_dir(&path).unwrap();

    let store = PersistentCredentialStore::load(CredentialBackend::File(path)).await;
    store.set_from_login(&login()).await;

    assert_eq!(store.access_token().as_deref(), Some("a1"));
}
