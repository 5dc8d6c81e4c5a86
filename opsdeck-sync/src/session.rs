//! Identity and session binding.
//!
//! The identity provider is an external collaborator behind
//! [`IdentityProvider`]. The [`SessionManager`] is the session binder: on
//! every identity change it resolves the signed-in identity to its linked
//! `users` record with a one-shot store lookup, and it carries the
//! console's login/register/logout flows.

use crate::error::SyncResult;
use crate::notice::NoticeSender;
use crate::resource::to_field_map;
use async_trait::async_trait;
use opsdeck_store::KeyedStore;
use opsdeck_types::{Keyed, Resource, Role, UserRecord};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Result type for identity-provider operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors surfaced by the identity provider.
///
/// Messages are shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// The email/password pair did not match an account.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    EmailInUse,

    /// Any other provider-side failure.
    #[error("{0}")]
    Provider(String),
}

/// An authenticated identity as issued by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Provider-assigned account id. Matches `UserRecord::auth_uid`.
    pub uid: String,
    pub email: String,
}

/// Authenticates credentials and notifies subscribers of identity changes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Signs in with existing credentials.
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity>;

    /// Registers a new account and signs it in.
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity>;

    /// Signs the current identity out.
    async fn sign_out(&self) -> AuthResult<()>;

    /// A stream of the current identity; `None` when signed out.
    fn identity_changes(&self) -> watch::Receiver<Option<Identity>>;
}

struct Account {
    password: String,
    uid: String,
}

/// In-process identity provider for tests and local development.
pub struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    current: watch::Sender<Option<Identity>>,
}

impl MemoryIdentityProvider {
    /// Creates a provider with no accounts and nobody signed in.
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current,
        }
    }

    /// Seeds an account without signing it in. Returns the account uid.
    pub fn with_account(&self, email: &str, password: &str) -> String {
        let uid = Uuid::new_v4().to_string();
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                uid: uid.clone(),
            },
        );
        uid
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get(email)
            .filter(|a| a.password == password)
            .ok_or(AuthError::InvalidCredentials)?;
        let identity = Identity {
            uid: account.uid.clone(),
            email: email.to_string(),
        };
        drop(accounts);
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AuthError::EmailInUse);
        }
        let uid = Uuid::new_v4().to_string();
        accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                uid: uid.clone(),
            },
        );
        drop(accounts);
        let identity = Identity {
            uid,
            email: email.to_string(),
        };
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.current.send_replace(None);
        Ok(())
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

/// An identity enriched with its linked `users` record, when one exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: Identity,
    /// The linked profile; absent when no `users` record matches the
    /// identity's uid.
    pub profile: Option<Keyed<UserRecord>>,
}

/// The state the session manager publishes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// `None` when signed out.
    pub session: Option<Session>,
    /// True until the current identity has been resolved (never stuck: it
    /// clears on success and failure alike).
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }
}

/// The session binder.
///
/// Joins the provider's current identity to its `users` record. The
/// lookup strategy is a one-shot read, re-run on every identity change;
/// the session is declared loaded only after the lookup resolves.
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    store: Option<Arc<dyn KeyedStore>>,
    notices: NoticeSender,
    state: Arc<watch::Sender<SessionState>>,
    binder: Option<JoinHandle<()>>,
}

impl SessionManager {
    /// Creates the manager and starts binding identity changes.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Option<Arc<dyn KeyedStore>>,
        notices: NoticeSender,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        let state = Arc::new(state);

        let binder_state = Arc::clone(&state);
        let binder_store = store.clone();
        let mut changes = provider.identity_changes();
        let binder = tokio::spawn(async move {
            loop {
                let identity = changes.borrow_and_update().clone();
                let session = match identity {
                    None => None,
                    Some(identity) => {
                        let profile = resolve_profile(&binder_store, &identity).await;
                        Some(Session { identity, profile })
                    }
                };
                binder_state.send_replace(SessionState {
                    session,
                    loading: false,
                });
                if changes.changed().await.is_err() {
                    break;
                }
            }
        });

        Self {
            provider,
            store,
            notices,
            state,
            binder: Some(binder),
        }
    }

    /// The current session state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// A receiver that observes session state changes.
    pub fn watcher(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Signs in. The provider's error message is surfaced verbatim and
    /// the loading flag clears on success and failure alike.
    pub async fn login(&self, email: &str, password: &str) -> SyncResult<()> {
        self.state.send_modify(|s| s.loading = true);
        match self.provider.sign_in(email, password).await {
            Ok(identity) => {
                debug!(uid = %identity.uid, "signed in");
                self.notices.info("Logged in successfully.");
                Ok(())
            }
            Err(err) => {
                self.notices.error(err.to_string());
                self.state.send_modify(|s| s.loading = false);
                Err(err.into())
            }
        }
    }

    /// Registers a new account and appends its linked `users` record
    /// (role `user`; name defaults to the email local part when blank).
    ///
    /// The record is validated up front, so invalid input reaches neither
    /// the provider nor the store.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> SyncResult<()> {
        self.state.send_modify(|s| s.loading = true);

        let name = if name.trim().is_empty() {
            email.split('@').next().unwrap_or_default()
        } else {
            name
        };
        let mut record = UserRecord {
            auth_uid: String::new(),
            email: email.to_string(),
            name: name.to_string(),
            role: Role::User,
        };
        if let Err(err) = record.validate() {
            self.notices.error(err.to_string());
            self.state.send_modify(|s| s.loading = false);
            return Err(err.into());
        }

        let identity = match self.provider.sign_up(email, password).await {
            Ok(identity) => identity,
            Err(err) => {
                self.notices.error(err.to_string());
                self.state.send_modify(|s| s.loading = false);
                return Err(err.into());
            }
        };
        record.auth_uid = identity.uid.clone();

        if let Some(store) = &self.store {
            let fields = to_field_map(&record)?;
            if let Err(err) = store.append(UserRecord::PATH, fields).await {
                warn!(%err, "failed to create profile record");
                self.notices
                    .error(format!("Failed to create profile: {err}"));
                self.state.send_modify(|s| s.loading = false);
                return Err(err.into());
            }
        }

        self.notices.info("Account created and logged in.");
        Ok(())
    }

    /// Signs out. The session becomes `None` through the identity-change
    /// stream.
    pub async fn logout(&self) -> SyncResult<()> {
        match self.provider.sign_out().await {
            Ok(()) => {
                self.notices.info("Logged out.");
                Ok(())
            }
            Err(err) => {
                self.notices.error(err.to_string());
                Err(err.into())
            }
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(binder) = self.binder.take() {
            binder.abort();
        }
    }
}

/// One-shot lookup of the `users` record whose `auth_uid` matches the
/// identity. Lookup failures degrade to a bare identity.
async fn resolve_profile(
    store: &Option<Arc<dyn KeyedStore>>,
    identity: &Identity,
) -> Option<Keyed<UserRecord>> {
    let store = store.as_ref()?;
    let snapshot = match store.read(UserRecord::PATH).await {
        Ok(snapshot) => snapshot?,
        Err(err) => {
            warn!(%err, "profile lookup failed");
            return None;
        }
    };
    for (key, fields) in &snapshot {
        if fields.get("auth_uid").and_then(Value::as_str) == Some(identity.uid.as_str()) {
            match serde_json::from_value::<UserRecord>(Value::Object(fields.clone())) {
                Ok(record) => return Some(Keyed::new(key.clone(), record)),
                Err(err) => warn!(key = %key, %err, "skipping undecodable user record"),
            }
        }
    }
    None
}
