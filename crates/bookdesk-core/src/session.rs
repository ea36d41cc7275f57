// ── Session service ──
//
// Explicit, injectable auth state. The HTTP client reads the bearer token
// through `AuthHandler` and reports 401s back here, which clears the
// session, forgets the durable token, drops the query cache and sends the
// history to login.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bookdesk_api::{AdminClient, AuthHandler};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cache::QueryCache;
use crate::error::{CoreError, FieldErrors};
use crate::form::validate;
use crate::route::{History, Route};

/// Who is logged in. Unknown after a restore until the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<SecretString>,
    pub user: Option<UserInfo>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

// ── Durable token storage ────────────────────────────────────────────

/// Where the bearer token survives restarts.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<SecretString>, CoreError>;
    fn save(&self, token: &SecretString) -> Result<(), CoreError>;
    fn clear(&self) -> Result<(), CoreError>;
}

/// Process-local token store.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: ArcSwapOption<SecretString>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::default();
        store
            .token
            .store(Some(Arc::new(SecretString::from(token.into()))));
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, CoreError> {
        Ok(self.token.load_full().map(|t| (*t).clone()))
    }

    fn save(&self, token: &SecretString) -> Result<(), CoreError> {
        self.token.store(Some(Arc::new(token.clone())));
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.token.store(None);
        Ok(())
    }
}

// ── SessionContext ───────────────────────────────────────────────────

/// The one owner of session state.
pub struct SessionContext {
    state: watch::Sender<Session>,
    store: Arc<dyn TokenStore>,
    history: History,
    cache: QueryCache,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.state.borrow().is_authenticated())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Restore from the durable store: authenticated iff a token exists.
    /// `cache` holds data fetched under this session and is emptied
    /// whenever the session ends.
    pub fn restore(store: Arc<dyn TokenStore>, history: History, cache: QueryCache) -> Self {
        let token = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not read stored token");
            None
        });
        let (state, _) = watch::channel(Session { token, user: None });
        Self {
            state,
            store,
            history,
            cache,
        }
    }

    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Validate credentials, exchange them for a token, persist it and go
    /// to the dashboard (replacing the login entry).
    pub async fn login(
        &self,
        client: &AdminClient,
        email: &str,
        password: &SecretString,
    ) -> Result<UserInfo, CoreError> {
        validate_credentials(email, password)?;

        let resp = client
            .login(email.trim(), password)
            .await
            .map_err(|e| CoreError::Api {
                status: e.status(),
                message: Some(login_error_message(&e)),
            })?;

        self.store.save(&resp.token)?;
        let user = UserInfo {
            name: resp.name,
            role: resp.role,
        };
        self.state.send_replace(Session {
            token: Some(resp.token),
            user: Some(user.clone()),
        });
        info!(name = %user.name, role = %user.role, "logged in");
        self.history.replace(Route::Dashboard.into());
        Ok(user)
    }

    /// Clear the session, the durable token and the cache, then go to login.
    pub fn logout(&self) {
        self.clear();
        info!("logged out");
        self.history.replace(Route::Login.into());
    }

    fn clear(&self) {
        self.state.send_replace(Session::default());
        self.cache.clear();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not clear stored token");
        }
    }
}

impl AuthHandler for SessionContext {
    fn token(&self) -> Option<SecretString> {
        self.state.borrow().token.clone()
    }

    fn unauthorized(&self) {
        warn!("session rejected by API, forcing logout");
        self.clear();
        self.history.replace(Route::Login.into());
    }
}

fn validate_credentials(email: &str, password: &SecretString) -> Result<(), CoreError> {
    let mut errors = FieldErrors::new();
    if !validate::is_email(email.trim()) {
        errors.insert("email".into(), "Please enter a valid email address".into());
    }
    if password.expose_secret().chars().count() < validate::MIN_PASSWORD_LEN {
        errors.insert(
            "password".into(),
            "Password must be at least 6 characters".into(),
        );
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation { errors })
    }
}

/// Message shown for a failed login: the server's `error`, else the
/// status, else a network failure.
pub fn login_error_message(err: &bookdesk_api::Error) -> String {
    if let Some(message) = err.server_message() {
        return message;
    }
    match err.status() {
        Some(status) => format!("Error {status}"),
        None => "Network error: unable to reach API".to_owned(),
    }
}
