use opsdeck_store::{FieldMap, KeyedStore, MemoryStore};
use opsdeck_sync::{
    notice_channel, AuthError, IdentityProvider, MemoryIdentityProvider, NoticeReceiver,
    NoticeSeverity, SessionManager, SyncError,
};
use opsdeck_types::Role;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn fields(value: serde_json::Value) -> FieldMap {
    value.as_object().unwrap().clone()
}

fn make_manager(
    provider: Arc<MemoryIdentityProvider>,
    store: &MemoryStore,
) -> (SessionManager, NoticeReceiver) {
    let (notices, notice_rx) = notice_channel();
    let store: Arc<dyn KeyedStore> = Arc::new(store.clone());
    (
        SessionManager::new(provider, Some(store), notices),
        notice_rx,
    )
}

// ── Login ────────────────────────────────────────────────────────

#[tokio::test]
async fn login_resolves_linked_profile() {
    let provider = Arc::new(MemoryIdentityProvider::new());
    let uid = provider.with_account("ada@example.test", "pw");

    let store = MemoryStore::new();
    store.insert(
        "users",
        "u1",
        fields(json!({
            "auth_uid": uid,
            "email": "ada@example.test",
            "name": "Ada",
            "role": "admin",
        })),
    );

    let (manager, mut notices) = make_manager(provider, &store);
    let mut rx = manager.watcher();

    manager.login("ada@example.test", "pw").await.unwrap();
    rx.wait_for(|s| s.session.is_some() && !s.loading).await.unwrap();

    let state = manager.state();
    let session = state.session.unwrap();
    assert_eq!(session.identity.uid, uid);
    let profile = session.profile.unwrap();
    assert_eq!(profile.key, "u1");
    assert_eq!(profile.fields.name, "Ada");
    assert_eq!(profile.fields.role, Role::Admin);

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.message, "Logged in successfully.");
}

#[tokio::test]
async fn login_without_profile_exposes_bare_identity() {
    let provider = Arc::new(MemoryIdentityProvider::new());
    let uid = provider.with_account("ada@example.test", "pw");
    let store = MemoryStore::new();

    let (manager, _notices) = make_manager(provider, &store);
    let mut rx = manager.watcher();

    manager.login("ada@example.test", "pw").await.unwrap();
    rx.wait_for(|s| s.session.is_some()).await.unwrap();

    let session = manager.state().session.unwrap();
    assert_eq!(session.identity.uid, uid);
    assert_eq!(session.profile, None);
}

#[tokio::test]
async fn bad_credentials_surface_verbatim_and_clear_loading() {
    let provider = Arc::new(MemoryIdentityProvider::new());
    provider.with_account("ada@example.test", "pw");
    let store = MemoryStore::new();

    let (manager, mut notices) = make_manager(provider, &store);

    let err = manager.login("ada@example.test", "wrong").await.unwrap_err();
    assert_eq!(err, SyncError::Auth(AuthError::InvalidCredentials));

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.severity, NoticeSeverity::Error);
    assert_eq!(notice.message, AuthError::InvalidCredentials.to_string());
    assert!(!manager.state().loading, "spinner must not stick");
}

// ── Registration ─────────────────────────────────────────────────

#[tokio::test]
async fn register_creates_linked_user_record() {
    let provider = Arc::new(MemoryIdentityProvider::new());
    let store = MemoryStore::new();
    let (manager, mut notices) = make_manager(provider, &store);
    let mut rx = manager.watcher();

    manager
        .register("new@example.test", "pw", "Newcomer")
        .await
        .unwrap();
    rx.wait_for(|s| s.session.is_some()).await.unwrap();
    let identity = manager.state().session.unwrap().identity;

    let snapshot = store.read("users").await.unwrap().unwrap();
    assert_eq!(snapshot.len(), 1);
    let (_, record) = snapshot.iter().next().unwrap();
    assert_eq!(record["auth_uid"], identity.uid.as_str());
    assert_eq!(record["email"], "new@example.test");
    assert_eq!(record["name"], "Newcomer");
    // All new registrations start as plain users.
    assert_eq!(record["role"], "user");

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.message, "Account created and logged in.");
}

#[tokio::test]
async fn register_defaults_name_to_email_local_part() {
    let provider = Arc::new(MemoryIdentityProvider::new());
    let store = MemoryStore::new();
    let (manager, _notices) = make_manager(provider, &store);

    manager.register("ada@example.test", "pw", "  ").await.unwrap();

    let snapshot = store.read("users").await.unwrap().unwrap();
    let (_, record) = snapshot.iter().next().unwrap();
    assert_eq!(record["name"], "ada");
}

#[tokio::test]
async fn register_with_blank_email_is_rejected_before_provider_and_store() {
    let provider = Arc::new(MemoryIdentityProvider::new());
    let store = MemoryStore::new();
    let (manager, mut notices) = make_manager(Arc::clone(&provider), &store);

    let err = manager.register("  ", "pw", "Ada").await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));

    // No account was created, nobody is signed in, no record was written.
    let changes = provider.identity_changes();
    assert_eq!(*changes.borrow(), None);
    assert_eq!(store.read("users").await.unwrap(), None);

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.severity, NoticeSeverity::Error);
    assert!(notice.message.contains("email"));
    assert!(!manager.state().loading);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let provider = Arc::new(MemoryIdentityProvider::new());
    provider.with_account("taken@example.test", "pw");
    let store = MemoryStore::new();
    let (manager, mut notices) = make_manager(provider, &store);

    let err = manager
        .register("taken@example.test", "pw2", "X")
        .await
        .unwrap_err();
    assert_eq!(err, SyncError::Auth(AuthError::EmailInUse));

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.message, AuthError::EmailInUse.to_string());
    // No profile record was written.
    assert_eq!(store.read("users").await.unwrap(), None);
    assert!(!manager.state().loading);
}

// ── Sign-out & rebinding ─────────────────────────────────────────

#[tokio::test]
async fn logout_clears_the_session() {
    let provider = Arc::new(MemoryIdentityProvider::new());
    provider.with_account("ada@example.test", "pw");
    let store = MemoryStore::new();
    let (manager, mut notices) = make_manager(provider, &store);
    let mut rx = manager.watcher();

    manager.login("ada@example.test", "pw").await.unwrap();
    rx.wait_for(|s| s.session.is_some()).await.unwrap();

    manager.logout().await.unwrap();
    rx.wait_for(|s| s.session.is_none() && !s.loading).await.unwrap();

    // Login + logout notices, in order.
    assert_eq!(notices.recv().await.unwrap().message, "Logged in successfully.");
    assert_eq!(notices.recv().await.unwrap().message, "Logged out.");
}

#[tokio::test]
async fn binder_reruns_on_every_identity_change() {
    let provider = Arc::new(MemoryIdentityProvider::new());
    let ada_uid = provider.with_account("ada@example.test", "pw");
    let bob_uid = provider.with_account("bob@example.test", "pw");

    let store = MemoryStore::new();
    store.insert("users", "u1", fields(json!({"auth_uid": ada_uid, "name": "Ada", "email": "ada@example.test"})));
    store.insert("users", "u2", fields(json!({"auth_uid": bob_uid, "name": "Bob", "email": "bob@example.test"})));

    let (manager, _notices) = make_manager(provider, &store);
    let mut rx = manager.watcher();

    manager.login("ada@example.test", "pw").await.unwrap();
    rx.wait_for(|s| {
        s.session
            .as_ref()
            .and_then(|s| s.profile.as_ref())
            .is_some_and(|p| p.fields.name == "Ada")
    })
    .await
    .unwrap();

    manager.login("bob@example.test", "pw").await.unwrap();
    rx.wait_for(|s| {
        s.session
            .as_ref()
            .and_then(|s| s.profile.as_ref())
            .is_some_and(|p| p.fields.name == "Bob")
    })
    .await
    .unwrap();
}
