// ── Console ──
//
// Composition root. Owns one of everything a screen needs (client,
// session, cache, history, notifier) and hands them out explicitly.
// Cheap to clone; every clone shares the same state.

use std::sync::Arc;

use bookdesk_api::{AdminClient, AuthHandler};
use secrecy::SecretString;

use crate::cache::QueryCache;
use crate::config::ConsoleConfig;
use crate::dashboard::Dashboard;
use crate::error::CoreError;
use crate::form::{FormModal, FormSchema};
use crate::list::{ListController, ListResource};
use crate::notify::Notifier;
use crate::route::{History, Location, Route, guard};
use crate::session::{SessionContext, TokenStore, UserInfo};

#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    config: ConsoleConfig,
    client: AdminClient,
    session: Arc<SessionContext>,
    cache: QueryCache,
    history: History,
    notifier: Notifier,
}

impl Console {
    /// Wire everything up and restore the session from `store`. Starts at
    /// whatever the guard resolves the root path to.
    pub fn new(config: ConsoleConfig, store: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        let history = History::new(Location::new("/"));
        let cache = QueryCache::new();
        let session = Arc::new(SessionContext::restore(store, history.clone(), cache.clone()));
        let auth: Arc<dyn AuthHandler> = session.clone();
        let client = AdminClient::new(config.api_url.clone(), auth, &config.transport)?;

        let start = guard(None, &session.current());
        history.replace(start.into());

        Ok(Self {
            inner: Arc::new(ConsoleInner {
                config,
                client,
                session,
                cache,
                history,
                notifier: Notifier::new(),
            }),
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &AdminClient {
        &self.inner.client
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn history(&self) -> &History {
        &self.inner.history
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.session.is_authenticated()
    }

    /// The screen actually shown for the current history entry.
    pub fn current_route(&self) -> Route {
        let requested = self.inner.history.current().route();
        guard(requested, &self.inner.session.current())
    }

    /// Navigate, applying the auth guard.
    pub fn navigate(&self, route: Route) -> Route {
        let resolved = guard(Some(route), &self.inner.session.current());
        self.inner.history.navigate(resolved.clone());
        resolved
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<UserInfo, CoreError> {
        self.inner
            .session
            .login(&self.inner.client, email, password)
            .await
    }

    /// End the session. Cached data belonged to it and is dropped too.
    pub fn logout(&self) {
        self.inner.session.logout();
    }

    // ── Screens ──────────────────────────────────────────────────────

    pub fn list<R: ListResource>(&self) -> ListController<R> {
        ListController::mount(self.clone())
    }

    pub fn form<S: FormSchema>(&self) -> FormModal<S> {
        FormModal::new(self.clone())
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.clone())
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("session", &self.inner.session)
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}
