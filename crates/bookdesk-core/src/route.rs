// ── Router surface ──
//
// Path <-> route mapping, an in-memory navigation history whose entries
// carry the query string list controllers keep their state in, and the
// authentication guard.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use url::form_urlencoded;

use crate::resource::Resource;
use crate::session::Session;

/// A screen of the console.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    List(Resource),
    Create(Resource),
    /// Edit screen; the id is a record id or, for settings, the key.
    Edit(Resource, String),
}

impl Route {
    /// Parse a path. `None` means an unknown path, which resolves to the
    /// root index.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        match segments.as_slice() {
            ["login"] => Some(Self::Login),
            ["dashboard"] => Some(Self::Dashboard),
            ["dashboard", resource] => resource.parse().ok().map(Self::List),
            ["dashboard", resource, "new"] => resource.parse().ok().map(Self::Create),
            ["dashboard", resource, id, "edit"] => resource
                .parse()
                .ok()
                .map(|resource| Self::Edit(resource, (*id).to_owned())),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_owned(),
            Self::Dashboard => "/dashboard".to_owned(),
            Self::List(resource) => format!("/dashboard/{resource}"),
            Self::Create(resource) => format!("/dashboard/{resource}/new"),
            Self::Edit(resource, id) => format!("/dashboard/{resource}/{id}/edit"),
        }
    }

    fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Resolve what is actually shown for a requested route.
///
/// Unknown paths go to the dashboard when authenticated and to login
/// otherwise; every dashboard route requires a session.
pub fn guard(requested: Option<Route>, session: &Session) -> Route {
    match requested {
        None if session.is_authenticated() => Route::Dashboard,
        None => Route::Login,
        Some(route) if route.requires_auth() && !session.is_authenticated() => Route::Login,
        Some(route) => route,
    }
}

// ── Location ─────────────────────────────────────────────────────────

/// One history entry: a path plus its query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    /// Parse `"/dashboard/books?page=2&q=dune"`.
    pub fn parse(href: &str) -> Self {
        let (path, query) = href.split_once('?').unwrap_or((href, ""));
        Self {
            path: path.to_owned(),
            query: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn route(&self) -> Option<Route> {
        Route::parse(&self.path)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish()
    }

    pub fn href(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string())
        }
    }
}

impl From<Route> for Location {
    fn from(route: Route) -> Self {
        Self::new(route.path())
    }
}

// ── History ──────────────────────────────────────────────────────────

/// Entries plus the cursor into them.
#[derive(Debug, Clone)]
pub struct HistoryState {
    entries: Vec<Location>,
    index: usize,
}

impl HistoryState {
    pub fn current(&self) -> &Location {
        // `index` always points at an entry; the list is never empty.
        &self.entries[self.index.min(self.entries.len() - 1)]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-memory navigation history with browser semantics: `push` drops any
/// forward entries, `replace` rewrites the current one in place.
#[derive(Debug, Clone)]
pub struct History {
    state: Arc<watch::Sender<HistoryState>>,
}

impl History {
    pub fn new(start: Location) -> Self {
        let (state, _) = watch::channel(HistoryState {
            entries: vec![start],
            index: 0,
        });
        Self {
            state: Arc::new(state),
        }
    }

    pub fn current(&self) -> Location {
        self.state.borrow().current().clone()
    }

    pub fn push(&self, location: Location) {
        self.state.send_modify(|s| {
            s.entries.truncate(s.index + 1);
            s.entries.push(location);
            s.index = s.entries.len() - 1;
        });
    }

    pub fn replace(&self, location: Location) {
        self.state.send_modify(|s| {
            if let Some(slot) = s.entries.get_mut(s.index) {
                *slot = location;
            }
        });
    }

    pub fn navigate(&self, route: Route) {
        self.push(route.into());
    }

    /// Step back. Returns `false` at the first entry.
    pub fn back(&self) -> bool {
        self.state.send_if_modified(|s| {
            if s.index == 0 {
                return false;
            }
            s.index -= 1;
            true
        })
    }

    /// Step forward. Returns `false` at the last entry.
    pub fn forward(&self) -> bool {
        self.state.send_if_modified(|s| {
            if s.index + 1 >= s.entries.len() {
                return false;
            }
            s.index += 1;
            true
        })
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryState> {
        self.state.subscribe()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Location::new("/"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn paths_round_trip() {
        for route in [
            Route::Login,
            Route::Dashboard,
            Route::List(Resource::Settings),
            Route::Create(Resource::Books),
            Route::Edit(Resource::Authors, "12".into()),
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
        assert_eq!(Route::parse("/dashboard/widgets"), None);
        assert_eq!(Route::parse("/"), None);
    }

    #[test]
    fn guard_sends_anonymous_users_to_login() {
        let anonymous = Session::default();
        let signed_in = Session {
            token: Some(SecretString::from("t".to_owned())),
            user: None,
        };

        assert_eq!(guard(Route::parse("/dashboard/books"), &anonymous), Route::Login);
        assert_eq!(guard(None, &anonymous), Route::Login);
        assert_eq!(guard(None, &signed_in), Route::Dashboard);
        assert_eq!(
            guard(Route::parse("/dashboard/books"), &signed_in),
            Route::List(Resource::Books)
        );
    }

    #[test]
    fn query_string_is_encoded() {
        let loc = Location::parse("/dashboard/books?q=war%20and%20peace&page=2");
        assert_eq!(loc.get("q"), Some("war and peace"));
        assert_eq!(loc.href(), "/dashboard/books?page=2&q=war+and+peace");
    }

    #[test]
    fn push_truncates_forward_entries() {
        let history = History::new(Location::new("/dashboard"));
        history.push(Location::new("/dashboard/books"));
        history.push(Location::new("/dashboard/authors"));
        assert!(history.back());
        history.push(Location::new("/dashboard/users"));

        assert_eq!(history.len(), 3);
        assert!(!history.forward());
        assert_eq!(history.current().path, "/dashboard/users");
    }

    #[test]
    fn replace_keeps_length() {
        let history = History::new(Location::new("/dashboard/books"));
        history.replace(Location::parse("/dashboard/books?page=1&limit=20"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().get("limit"), Some("20"));
        assert!(!history.back());
    }
}
