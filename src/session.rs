//! Session manager
//! Single source of truth for "who is logged in". Synchronizes the
//! in-memory user with the credential store at startup, login and logout,
//! and exposes an explicit expiry hook instead of navigating anywhere
//! itself.

use std::sync::{Arc, RwLock};

use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::endpoints::AuthApi;
use crate::error::Result;
use crate::models::User;
use crate::storage::CredentialStore;

type ExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// Session lifecycle: `loading` only during initial restoration, then
/// authenticated or unauthenticated.
struct SessionState {
    user: Option<User>,
    loading: bool,
}

/// Point-in-time view handed to callers (route guards, UI).
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub is_loading: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

pub struct SessionManager {
    auth: AuthApi,
    store: Arc<CredentialStore>,
    state: RwLock<SessionState>,
    on_expired: RwLock<Option<ExpiredHook>>,
}

impl SessionManager {
    /// Build a session manager on top of an API client and wire it to the
    /// client's terminal-auth-failure signal.
    pub fn new(client: Arc<ApiClient>) -> Arc<Self> {
        let store = Arc::clone(client.credential_store());
        let manager = Arc::new(Self {
            auth: AuthApi::new(Arc::clone(&client)),
            store,
            state: RwLock::new(SessionState {
                user: None,
                loading: true,
            }),
            on_expired: RwLock::new(None),
        });

        let weak = Arc::downgrade(&manager);
        client.on_session_expired(move || {
            if let Some(manager) = weak.upgrade() {
                manager.handle_session_expired();
            }
        });

        manager
    }

    /// Register the host application's expiry callback. Fired once per
    /// authenticated-to-unauthenticated transition caused by a terminal
    /// authentication failure.
    pub fn on_session_expired(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_expired.write().unwrap() = Some(Arc::new(hook));
    }

    /// Restore the session at application start.
    ///
    /// If tokens and a saved profile exist, the user is set optimistically
    /// so the caller never observes a logged-out flash, then the profile is
    /// re-validated against the server in the background.
    pub async fn initialize(self: &Arc<Self>) {
        let token = self.store.get_access_token();
        let saved_user = self.store.get_user();

        match (token, saved_user) {
            (Some(_), Some(user)) => {
                info!(username = %user.username, "restored session from storage");
                {
                    let mut state = self.state.write().unwrap();
                    state.user = Some(user);
                    state.loading = false;
                }
                let manager = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(err) = manager.refresh_user().await {
                        debug!(error = %err, "background profile validation failed");
                    }
                });
            }
            _ => {
                let mut state = self.state.write().unwrap();
                state.user = None;
                state.loading = false;
            }
        }
    }

    /// Authenticate. On success the tokens and profile are stored and the
    /// session becomes authenticated; on failure nothing is mutated.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let data = self.auth.login(username, password).await?;
        self.store.set_tokens(&data.access_token, &data.refresh_token);
        self.apply_user(data.user.clone());
        info!(username = %data.user.username, "login succeeded");
        Ok(data.user)
    }

    /// End the session. The server is informed best-effort; the local
    /// clear and the unauthenticated transition are unconditional.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.store.get_refresh_token() {
            if let Err(err) = self.auth.logout(refresh_token.expose_secret()).await {
                warn!(error = %err, "server-side logout failed, clearing local session anyway");
            }
        }
        self.store.clear_tokens();
        let mut state = self.state.write().unwrap();
        state.user = None;
        state.loading = false;
        info!("logged out");
    }

    /// Re-fetch the profile from the server and replace the local copy
    /// wholesale. A terminal authentication failure forces the session to
    /// unauthenticated.
    pub async fn refresh_user(&self) -> Result<()> {
        if self.store.get_access_token().is_none() {
            return Ok(());
        }
        match self.auth.me().await {
            Ok(user) => {
                self.apply_user(user);
                Ok(())
            }
            Err(err) if err.is_auth_failure() => {
                self.handle_session_expired();
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Local-only replacement of the profile, e.g. after a
    /// credentials-change flow already returned the updated record.
    pub fn update_user(&self, user: User) {
        debug!(username = %user.username, "updating local user state");
        self.apply_user(user);
    }

    /// Change username and password in one round trip; the session keeps
    /// the server's updated profile.
    pub async fn change_credentials(
        &self,
        current_password: &str,
        new_username: &str,
        new_password: &str,
    ) -> Result<User> {
        let user = self
            .auth
            .change_credentials(current_password, new_username, new_password)
            .await?;
        self.apply_user(user.clone());
        Ok(user)
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<()> {
        self.auth
            .change_password(current_password, new_password)
            .await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().unwrap();
        SessionSnapshot {
            user: state.user.clone(),
            is_loading: state.loading,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().unwrap().user.is_some()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.read().unwrap().user.clone()
    }

    fn apply_user(&self, user: User) {
        self.store.set_user(&user);
        let mut state = self.state.write().unwrap();
        state.user = Some(user);
        state.loading = false;
    }

    /// Converge to logged-out after a terminal authentication failure.
    /// Idempotent: the host callback only fires on an actual transition.
    fn handle_session_expired(&self) {
        let was_authenticated = {
            let mut state = self.state.write().unwrap();
            state.loading = false;
            state.user.take().is_some()
        };
        self.store.clear_tokens();

        if was_authenticated {
            warn!("session expired, transitioning to unauthenticated");
            let hook = self.on_expired.read().unwrap().clone();
            if let Some(hook) = hook {
                hook();
            }
        }
    }
}
