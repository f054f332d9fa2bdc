//! Session manager integration tests.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{alice, spawn_backend, test_session};
use secrecy::ExposeSecret;
use wastedesk_client::ApiError;

#[tokio::test]
async fn test_login_success_transitions_to_authenticated() {
    let backend = spawn_backend().await;
    let (session, store) = test_session(&backend);

    let user = session.login("alice", "secret").await.unwrap();
    assert_eq!(user.username, "alice");

    let snapshot = session.snapshot();
    assert!(snapshot.is_authenticated());
    assert_eq!(snapshot.user.unwrap().username, "alice");
    assert!(!snapshot.is_loading);

    assert_eq!(store.get_access_token().unwrap().expose_secret(), "tok1");
    assert_eq!(store.get_refresh_token().unwrap().expose_secret(), "rt1");
    assert_eq!(store.get_user().unwrap().username, "alice");
}

#[tokio::test]
async fn test_login_failure_mutates_nothing() {
    let backend = spawn_backend().await;
    let (session, store) = test_session(&backend);

    let err = session.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(err.user_message(), "Authentication failed");

    assert!(!session.is_authenticated());
    assert!(store.get_access_token().is_none());
    assert!(store.get_user().is_none());
}

#[tokio::test]
async fn test_logout_is_unconditional_when_server_fails() {
    let backend = spawn_backend().await;
    let (session, store) = test_session(&backend);

    session.login("alice", "secret").await.unwrap();
    backend.fail_logout();

    session.logout().await;

    assert!(!session.is_authenticated());
    assert!(store.get_access_token().is_none());
    assert!(store.get_refresh_token().is_none());
}

#[tokio::test]
async fn test_logout_goes_out_bare_and_never_refreshes() {
    let backend = spawn_backend().await;
    let (session, store) = test_session(&backend);
    session.login("alice", "secret").await.unwrap();

    // Even with a stale access token the teardown must not enter the
    // refresh flow; the token to revoke travels in the body.
    backend.set_valid_token("rotated-away");
    session.logout().await;

    assert!(!session.is_authenticated());
    assert!(store.get_refresh_token().is_none());
    assert_eq!(backend.logout_auth_headers(), vec![None]);
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn test_refresh_endpoint_failure_forces_unauthenticated() {
    let backend = spawn_backend().await;
    let (session, store) = test_session(&backend);

    session.login("alice", "secret").await.unwrap();

    // Invalidate the access token server-side and break refresh, so the
    // next profile fetch ends in a terminal authentication failure.
    backend.set_valid_token("rotated-away");
    backend.fail_refresh();

    let expired = Arc::new(AtomicBool::new(false));
    let expired_flag = Arc::clone(&expired);
    session.on_session_expired(move || {
        expired_flag.store(true, Ordering::SeqCst);
    });

    let err = session.refresh_user().await.unwrap_err();
    assert!(err.is_auth_failure());

    assert!(!session.is_authenticated());
    assert!(store.get_access_token().is_none());
    assert!(store.get_refresh_token().is_none());
    assert!(expired.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_initialize_restores_persisted_session() {
    let backend = spawn_backend().await;
    let (session, store) = test_session(&backend);

    // A previous run left valid credentials behind.
    backend.set_valid_token("tok1");
    store.set_tokens("tok1", "rt1");
    store.set_user(&alice());

    session.initialize().await;

    // Authenticated immediately, before any network round trip settles.
    let snapshot = session.snapshot();
    assert!(snapshot.is_authenticated());
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.user.unwrap().username, "alice");

    // Background validation succeeds and keeps the session alive.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_initialize_without_credentials_is_unauthenticated() {
    let backend = spawn_backend().await;
    let (session, _store) = test_session(&backend);

    assert!(session.snapshot().is_loading);
    session.initialize().await;

    let snapshot = session.snapshot();
    assert!(!snapshot.is_loading);
    assert!(!snapshot.is_authenticated());
}

#[tokio::test]
async fn test_update_user_is_local_only() {
    let backend = spawn_backend().await;
    let (session, store) = test_session(&backend);
    session.login("alice", "secret").await.unwrap();

    let mut renamed = alice();
    renamed.username = "alice-renamed".to_string();
    session.update_user(renamed);

    assert_eq!(session.current_user().unwrap().username, "alice-renamed");
    assert_eq!(store.get_user().unwrap().username, "alice-renamed");
    // No extra auth traffic was generated.
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn test_refresh_user_replaces_profile_wholesale() {
    let backend = spawn_backend().await;
    let (session, _store) = test_session(&backend);
    session.login("alice", "secret").await.unwrap();

    // Locally drift the profile, then pull the canonical copy back.
    let mut drifted = alice();
    drifted.username = "drifted".to_string();
    session.update_user(drifted);

    session.refresh_user().await.unwrap();
    assert_eq!(session.current_user().unwrap().username, "alice");
}
