// ── List-screen controller ──
//
// Filter, page and limit live in the history entry's query string, so
// back/forward restore them. The fetched page comes from the query cache;
// a second, page-local filter on `q` and `active` is applied on top before
// rows are shown.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use bookdesk_api::{
    AdminClient, Author, Book, Category, ListParams, ListResult, Setting, Subcategory, User,
};
use futures_util::FutureExt as _;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use crate::cache::QueryObserver;
use crate::console::Console;
use crate::error::CoreError;
use crate::resource::{CacheKey, Resource};
use crate::route::{Location, Route};
use crate::upload::resolve_display_url;

const MAX_PAGE_BUTTONS: u64 = 5;

// ── Resource adapters ───────────────────────────────────────────────

/// Options for a confirmed delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Also remove the stored file (books only).
    pub delete_file: bool,
}

/// How one resource is listed, searched and deleted.
pub trait ListResource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    const RESOURCE: Resource;
    /// Server-side filters mirrored into the location besides `q`/`active`.
    const FILTERS: &'static [&'static str] = &[];
    /// Whether the endpoint takes `page`/`limit`.
    const PAGINATED: bool = true;

    fn fetch(
        client: &AdminClient,
        params: &ListParams,
    ) -> impl Future<Output = Result<ListResult<Self::Item>, bookdesk_api::Error>> + Send;

    fn delete(
        client: &AdminClient,
        item: &Self::Item,
        options: DeleteOptions,
    ) -> impl Future<Output = Result<Value, bookdesk_api::Error>> + Send;

    /// Fields the page-local search looks at.
    fn search_text(item: &Self::Item) -> Vec<&str>;

    /// `None` for resources without an activity flag.
    fn is_active(item: &Self::Item) -> Option<bool>;

    /// Record id, or the key for settings.
    fn item_key(item: &Self::Item) -> String;

    /// Human label for confirmations.
    fn label(item: &Self::Item) -> String;

    /// Storage key rendered as a row preview.
    fn image_key(_item: &Self::Item) -> Option<&str> {
        None
    }
}

pub struct BookList;

impl ListResource for BookList {
    type Item = Book;

    const RESOURCE: Resource = Resource::Books;
    const FILTERS: &'static [&'static str] = &["category_id", "featured"];

    async fn fetch(client: &AdminClient, params: &ListParams) -> Result<ListResult<Book>, bookdesk_api::Error> {
        client.list_books(params).await
    }

    async fn delete(client: &AdminClient, book: &Book, options: DeleteOptions) -> Result<Value, bookdesk_api::Error> {
        client.delete_book(book.id, options.delete_file).await
    }

    fn search_text(book: &Book) -> Vec<&str> {
        [
            Some(book.title.as_str()),
            book.author_names.as_deref(),
            book.category_name.as_deref(),
            book.subcategory_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn is_active(book: &Book) -> Option<bool> {
        Some(book.is_active)
    }

    fn item_key(book: &Book) -> String {
        book.id.to_string()
    }

    fn label(book: &Book) -> String {
        book.title.clone()
    }

    fn image_key(book: &Book) -> Option<&str> {
        book.thumbnail.as_deref()
    }
}

pub struct AuthorList;

impl ListResource for AuthorList {
    type Item = Author;

    const RESOURCE: Resource = Resource::Authors;

    async fn fetch(client: &AdminClient, params: &ListParams) -> Result<ListResult<Author>, bookdesk_api::Error> {
        client.list_authors(params).await
    }

    async fn delete(client: &AdminClient, author: &Author, _: DeleteOptions) -> Result<Value, bookdesk_api::Error> {
        client.delete_author(author.id).await
    }

    fn search_text(author: &Author) -> Vec<&str> {
        let mut text = vec![author.name.as_str(), author.slug.as_str()];
        text.extend(author.bio.as_deref());
        text
    }

    fn is_active(author: &Author) -> Option<bool> {
        Some(author.is_active)
    }

    fn item_key(author: &Author) -> String {
        author.id.to_string()
    }

    fn label(author: &Author) -> String {
        author.name.clone()
    }

    fn image_key(author: &Author) -> Option<&str> {
        author.image.as_deref()
    }
}

pub struct CategoryList;

impl ListResource for CategoryList {
    type Item = Category;

    const RESOURCE: Resource = Resource::Categories;

    async fn fetch(client: &AdminClient, params: &ListParams) -> Result<ListResult<Category>, bookdesk_api::Error> {
        client.list_categories(params).await
    }

    async fn delete(client: &AdminClient, category: &Category, _: DeleteOptions) -> Result<Value, bookdesk_api::Error> {
        client.delete_category(category.id).await
    }

    fn search_text(category: &Category) -> Vec<&str> {
        let mut text = vec![category.name.as_str(), category.slug.as_str()];
        text.extend(category.description.as_deref());
        text
    }

    fn is_active(category: &Category) -> Option<bool> {
        Some(category.is_active)
    }

    fn item_key(category: &Category) -> String {
        category.id.to_string()
    }

    fn label(category: &Category) -> String {
        category.name.clone()
    }
}

pub struct SubcategoryList;

impl ListResource for SubcategoryList {
    type Item = Subcategory;

    const RESOURCE: Resource = Resource::Subcategories;
    const FILTERS: &'static [&'static str] = &["category_id"];

    async fn fetch(client: &AdminClient, params: &ListParams) -> Result<ListResult<Subcategory>, bookdesk_api::Error> {
        client.list_subcategories(params).await
    }

    async fn delete(client: &AdminClient, sub: &Subcategory, _: DeleteOptions) -> Result<Value, bookdesk_api::Error> {
        client.delete_subcategory(sub.id).await
    }

    fn search_text(sub: &Subcategory) -> Vec<&str> {
        let mut text = vec![sub.name.as_str(), sub.slug.as_str()];
        text.extend(sub.category_name.as_deref());
        text
    }

    fn is_active(sub: &Subcategory) -> Option<bool> {
        Some(sub.is_active)
    }

    fn item_key(sub: &Subcategory) -> String {
        sub.id.to_string()
    }

    fn label(sub: &Subcategory) -> String {
        sub.name.clone()
    }
}

pub struct UserList;

impl ListResource for UserList {
    type Item = User;

    const RESOURCE: Resource = Resource::Users;
    const PAGINATED: bool = false;

    async fn fetch(client: &AdminClient, _: &ListParams) -> Result<ListResult<User>, bookdesk_api::Error> {
        client.list_users().await
    }

    async fn delete(client: &AdminClient, user: &User, _: DeleteOptions) -> Result<Value, bookdesk_api::Error> {
        client.delete_user(user.id).await
    }

    fn search_text(user: &User) -> Vec<&str> {
        vec![user.full_name.as_str(), user.email.as_str()]
    }

    fn is_active(user: &User) -> Option<bool> {
        Some(user.is_active)
    }

    fn item_key(user: &User) -> String {
        user.id.to_string()
    }

    fn label(user: &User) -> String {
        user.full_name.clone()
    }
}

pub struct SettingList;

impl ListResource for SettingList {
    type Item = Setting;

    const RESOURCE: Resource = Resource::Settings;
    const PAGINATED: bool = false;

    async fn fetch(client: &AdminClient, _: &ListParams) -> Result<ListResult<Setting>, bookdesk_api::Error> {
        client.list_settings().await
    }

    async fn delete(client: &AdminClient, setting: &Setting, _: DeleteOptions) -> Result<Value, bookdesk_api::Error> {
        client.delete_setting(&setting.setting_key).await
    }

    fn search_text(setting: &Setting) -> Vec<&str> {
        vec![setting.setting_key.as_str(), setting.setting_value.as_str()]
    }

    fn is_active(_: &Setting) -> Option<bool> {
        None
    }

    fn item_key(setting: &Setting) -> String {
        setting.setting_key.clone()
    }

    fn label(setting: &Setting) -> String {
        setting.setting_key.clone()
    }
}

// ── State ───────────────────────────────────────────────────────────

/// The `active` filter: unset, `1` or `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, EnumString)]
pub enum ActiveFilter {
    #[default]
    #[strum(serialize = "")]
    Any,
    #[strum(serialize = "1")]
    Active,
    #[strum(serialize = "0")]
    Inactive,
}

impl ActiveFilter {
    fn bit(self) -> Option<u8> {
        match self {
            Self::Any => None,
            Self::Active => Some(1),
            Self::Inactive => Some(0),
        }
    }

    fn admits(self, active: Option<bool>) -> bool {
        match (self, active) {
            (Self::Any, _) | (_, None) => true,
            (Self::Active, Some(flag)) => flag,
            (Self::Inactive, Some(flag)) => !flag,
        }
    }
}

/// List state as read from the current location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    pub page: u32,
    pub limit: u32,
    pub q: String,
    pub active: ActiveFilter,
    pub filters: BTreeMap<String, String>,
}

impl ListState {
    fn read<R: ListResource>(location: &Location, default_limit: u32) -> Self {
        let number = |name: &str| location.get(name).and_then(|v| v.parse::<u32>().ok());
        Self {
            page: number("page").filter(|p| *p >= 1).unwrap_or(1),
            limit: number("limit").filter(|l| *l > 0).unwrap_or(default_limit),
            q: location.get("q").unwrap_or_default().to_owned(),
            active: location
                .get("active")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            filters: R::FILTERS
                .iter()
                .filter_map(|name| {
                    location
                        .get(name)
                        .filter(|v| !v.is_empty())
                        .map(|v| ((*name).to_owned(), v.to_owned()))
                })
                .collect(),
        }
    }

    fn params<R: ListResource>(&self) -> ListParams {
        if !R::PAGINATED {
            return ListParams::default();
        }
        ListParams {
            page: Some(self.page),
            limit: Some(self.limit),
            q: Some(self.q.clone()).filter(|q| !q.is_empty()),
            active: self.active.bit(),
            filters: self.filters.clone(),
        }
    }
}

// ── View ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ListDisplay {
    Loading,
    /// Nothing to show; `searching` tells "no records match" apart from
    /// "no records yet".
    Empty { searching: bool },
    Rows,
}

/// Everything a list screen renders.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    pub display: ListDisplay,
    /// Rows after the page-local filter.
    pub rows: Vec<T>,
    /// Rows the server returned for this page, before filtering.
    pub fetched: usize,
    pub page: u32,
    pub limit: u32,
    pub total: Option<u64>,
    pub total_pages: u64,
    pub can_prev: bool,
    pub can_next: bool,
    pub page_buttons: Vec<u64>,
    /// Showing the previous page while this one loads.
    pub is_previous: bool,
}

fn total_pages<T>(result: &ListResult<T>, limit: u32) -> u64 {
    result.total_pages.filter(|tp| *tp > 0).unwrap_or_else(|| {
        let count = result
            .total
            .filter(|t| *t > 0)
            .unwrap_or_else(|| u64::try_from(result.len()).unwrap_or(u64::MAX));
        count.div_ceil(u64::from(limit.max(1)))
    })
}

fn matches_query(haystack: &[&str], needle: &str) -> bool {
    needle.is_empty() || haystack.iter().any(|text| text.to_lowercase().contains(needle))
}

// ── Controller ──────────────────────────────────────────────────────

/// A mounted list screen.
pub struct ListController<R: ListResource> {
    console: Console,
    state: ListState,
    observer: QueryObserver<ListResult<R::Item>>,
    previews: HashMap<String, String>,
    pending_delete: Option<R::Item>,
}

impl<R: ListResource> ListController<R> {
    /// Mount on the resource's list route. Missing `page`/`limit` are
    /// filled in by replacing the current entry, not pushing one.
    pub fn mount(console: Console) -> Self {
        let history = console.history();
        let route = Route::List(R::RESOURCE);
        if history.current().route() != Some(route.clone()) {
            history.navigate(route);
        }

        let default_limit = console.config().page_size;
        let mut location = history.current();
        if R::PAGINATED && (location.get("page").is_none() || location.get("limit").is_none()) {
            location.query.entry("page".into()).or_insert_with(|| "1".into());
            location
                .query
                .entry("limit".into())
                .or_insert_with(|| default_limit.to_string());
            history.replace(location.clone());
        }

        let state = ListState::read::<R>(&location, default_limit);
        let (key, fetch) = Self::query(&console, &state);
        let observer = console.cache().observe(key, fetch);
        Self {
            console,
            state,
            observer,
            previews: HashMap::new(),
            pending_delete: None,
        }
    }

    fn query(
        console: &Console,
        state: &ListState,
    ) -> (
        CacheKey,
        impl Fn() -> BoxFuture<'static, Result<ListResult<R::Item>, CoreError>> + Send + Sync + 'static,
    ) {
        let params = state.params::<R>();
        let key = CacheKey::with_params(R::RESOURCE.scope(), params.to_pairs());
        let client = console.client().clone();
        let fetch = move || {
            let client = client.clone();
            let params = params.clone();
            async move { R::fetch(&client, &params).await.map_err(CoreError::from) }.boxed()
        };
        (key, fetch)
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn key(&self) -> &CacheKey {
        self.observer.key()
    }

    /// Re-read state from the current location (after back/forward or a
    /// setter) and point the query at it.
    pub fn sync(&mut self) {
        let location = self.console.history().current();
        if location.route() != Some(Route::List(R::RESOURCE)) {
            return;
        }
        self.state = ListState::read::<R>(&location, self.console.config().page_size);
        let (key, fetch) = Self::query(&self.console, &self.state);
        self.observer.set_key(key, fetch);
    }

    /// Push a new history entry with `update` applied to the query.
    fn navigate(&mut self, update: impl FnOnce(&mut BTreeMap<String, String>)) {
        let mut location = self.console.history().current();
        update(&mut location.query);
        location.query.retain(|_, v| !v.is_empty());
        debug!(resource = %R::RESOURCE, href = %location.href(), "list state changed");
        self.console.history().push(location);
        self.sync();
    }

    /// Any filter change starts again from the first page.
    fn navigate_filtered(&mut self, update: impl FnOnce(&mut BTreeMap<String, String>)) {
        self.navigate(|query| {
            update(query);
            if R::PAGINATED {
                query.insert("page".into(), "1".into());
            }
        });
    }

    pub fn set_page(&mut self, page: u32) {
        let page = page.max(1);
        self.navigate(|query| {
            query.insert("page".into(), page.to_string());
        });
    }

    /// Never goes below page 1.
    pub fn prev(&mut self) {
        self.set_page(self.state.page.saturating_sub(1).max(1));
    }

    /// No-op when the current page shows no sign of a further one.
    pub fn next(&mut self) {
        if self.view().can_next {
            self.set_page(self.state.page + 1);
        }
    }

    pub fn set_limit(&mut self, limit: u32) {
        let limit = limit.max(1);
        self.navigate_filtered(|query| {
            query.insert("limit".into(), limit.to_string());
        });
    }

    pub fn set_query(&mut self, q: &str) {
        let q = q.to_owned();
        self.navigate_filtered(|query| {
            query.insert("q".into(), q);
        });
    }

    pub fn set_active(&mut self, active: ActiveFilter) {
        self.navigate_filtered(|query| {
            query.insert("active".into(), active.to_string());
        });
    }

    /// Set a resource-specific filter. Unknown names are ignored.
    pub fn set_filter(&mut self, name: &str, value: &str) {
        if !R::FILTERS.iter().any(|f| *f == name) {
            warn!(resource = %R::RESOURCE, filter = name, "unknown list filter");
            return;
        }
        let (name, value) = (name.to_owned(), value.to_owned());
        self.navigate_filtered(|query| {
            query.insert(name, value);
        });
    }

    /// Fetch (or join, or reuse) the current page and resolve row previews.
    /// A failed fetch degrades to an empty view.
    pub async fn load(&mut self) -> ListView<R::Item> {
        if let Err(e) = self.observer.load().await {
            warn!(resource = %R::RESOURCE, error = %e, "list fetch failed");
        }
        self.resolve_previews().await;
        self.view()
    }

    pub async fn refresh(&mut self) -> ListView<R::Item> {
        if let Err(e) = self.observer.refresh().await {
            warn!(resource = %R::RESOURCE, error = %e, "list refresh failed");
        }
        self.resolve_previews().await;
        self.view()
    }

    /// Why the last fetch failed, while its result is still the current one.
    pub fn error(&self) -> Option<CoreError> {
        self.observer.view().error.map(|e| CoreError::clone(&e))
    }

    /// Wait until the underlying query changes.
    pub async fn changed(&mut self) -> bool {
        self.observer.changed().await
    }

    pub fn view(&self) -> ListView<R::Item> {
        let query = self.observer.view();
        let state = &self.state;
        let needle = state.q.trim().to_lowercase();
        let searching = !needle.is_empty() || state.active != ActiveFilter::Any;

        let Some(result) = query.data else {
            let display = if query.error.is_some() {
                ListDisplay::Empty { searching }
            } else {
                ListDisplay::Loading
            };
            return ListView {
                display,
                rows: Vec::new(),
                fetched: 0,
                page: state.page,
                limit: state.limit,
                total: None,
                total_pages: 0,
                can_prev: R::PAGINATED && state.page > 1,
                can_next: false,
                page_buttons: vec![1],
                is_previous: false,
            };
        };

        let rows: Vec<R::Item> = result
            .items
            .iter()
            .filter(|item| {
                matches_query(&R::search_text(item), &needle) && state.active.admits(R::is_active(item))
            })
            .cloned()
            .collect();
        let fetched = result.len();
        let total_pages = total_pages(&result, state.limit);
        let display = if rows.is_empty() {
            ListDisplay::Empty { searching }
        } else {
            ListDisplay::Rows
        };

        ListView {
            display,
            rows,
            fetched,
            page: state.page,
            limit: state.limit,
            total: result.total,
            total_pages,
            can_prev: R::PAGINATED && state.page > 1,
            can_next: R::PAGINATED && fetched >= usize::try_from(state.limit).unwrap_or(usize::MAX),
            page_buttons: (1..=total_pages.max(1).min(MAX_PAGE_BUTTONS)).collect(),
            is_previous: query.is_previous,
        }
    }

    // ── Row previews ─────────────────────────────────────────────────

    /// Resolved preview URL for a row; empty when the key did not resolve.
    pub fn preview(&self, item: &R::Item) -> Option<&str> {
        R::image_key(item).and_then(|key| self.previews.get(key).map(String::as_str))
    }

    async fn resolve_previews(&mut self) {
        let Some(result) = self.observer.view().data else {
            return;
        };
        let keys: Vec<String> = result
            .items
            .iter()
            .filter_map(R::image_key)
            .filter(|key| !key.is_empty() && !self.previews.contains_key(*key))
            .map(str::to_owned)
            .collect();
        for key in keys {
            let url = resolve_display_url(self.console.client(), &key)
                .await
                .unwrap_or_else(|e| {
                    debug!(%key, error = %e, "preview did not resolve");
                    String::new()
                });
            self.previews.insert(key, url);
        }
    }

    // ── Delete flow ──────────────────────────────────────────────────

    /// Open the confirmation for `item`.
    pub fn request_delete(&mut self, item: R::Item) {
        self.pending_delete = Some(item);
    }

    pub fn pending_delete(&self) -> Option<&R::Item> {
        self.pending_delete.as_ref()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the pending item. On success the confirmation closes and the
    /// resource's lists refetch; on failure it stays open for a retry.
    pub async fn confirm_delete(&mut self, options: DeleteOptions) -> Result<(), CoreError> {
        let Some(item) = self.pending_delete.as_ref() else {
            return Err(CoreError::Internal("no delete pending".into()));
        };
        let key = R::item_key(item);

        match R::delete(self.console.client(), item, options).await {
            Ok(_) => {
                self.pending_delete = None;
                self.console.cache().invalidate_scope(R::RESOURCE.scope()).await;
                info!(resource = %R::RESOURCE, %key, "deleted");
                self.console
                    .notifier()
                    .success(format!("{} deleted successfully", R::RESOURCE.singular()));
                Ok(())
            }
            Err(e) => {
                let err = CoreError::from(e);
                if !matches!(err, CoreError::Unauthorized) {
                    self.console.notifier().error(err.user_message("Delete failed"));
                }
                Err(err)
            }
        }
    }

    /// Find a loaded row by id (or key).
    pub fn find(&self, key: &str) -> Option<R::Item> {
        let result: Arc<ListResult<R::Item>> = self.observer.view().data?;
        result.items.iter().find(|item| R::item_key(item) == key).cloned()
    }
}

impl<R: ListResource> std::fmt::Debug for ListController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListController")
            .field("resource", &R::RESOURCE)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn result(n: usize, total: Option<u64>, total_pages: Option<u64>) -> ListResult<u8> {
        ListResult {
            items: vec![0; n],
            total,
            total_pages,
        }
    }

    #[test]
    fn total_pages_prefers_server_values() {
        assert_eq!(total_pages(&result(20, Some(95), Some(7)), 20), 7);
        assert_eq!(total_pages(&result(20, Some(95), None), 20), 5);
        assert_eq!(total_pages(&result(3, None, None), 20), 1);
        assert_eq!(total_pages(&result(0, None, None), 20), 0);
    }

    #[test]
    fn active_filter_parsing() {
        assert_eq!("1".parse::<ActiveFilter>().unwrap(), ActiveFilter::Active);
        assert_eq!("0".parse::<ActiveFilter>().unwrap(), ActiveFilter::Inactive);
        assert_eq!("".parse::<ActiveFilter>().unwrap(), ActiveFilter::Any);
        assert!(ActiveFilter::Inactive.admits(Some(false)));
        assert!(!ActiveFilter::Active.admits(Some(false)));
        assert!(ActiveFilter::Active.admits(None));
    }

    #[test]
    fn state_reads_location_with_fallbacks() {
        let loc = Location::parse("/dashboard/books?page=0&limit=x&q=Dune&category_id=4&bogus=1");
        let state = ListState::read::<BookList>(&loc, 20);
        assert_eq!(state.page, 1);
        assert_eq!(state.limit, 20);
        assert_eq!(state.q, "Dune");
        assert_eq!(state.filters.len(), 1);
        assert_eq!(state.params::<BookList>().to_pairs()["category_id"], "4");
    }

    #[test]
    fn unpaginated_resources_send_no_params() {
        let loc = Location::parse("/dashboard/users?page=3&q=ada");
        let state = ListState::read::<UserList>(&loc, 20);
        assert_eq!(state.params::<UserList>(), ListParams::default());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        assert!(matches_query(&["Dune", "Frank Herbert"], "herb"));
        assert!(!matches_query(&["Dune"], "zzz"));
        assert!(matches_query(&[], ""));
    }
}
