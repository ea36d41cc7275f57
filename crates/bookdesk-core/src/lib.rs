//! Controllers for the bookstore admin console, between `bookdesk-api` and
//! whatever renders them (the `bookdesk` CLI, tests).
//!
//! - **[`Console`]**: composition root. Owns the [`AdminClient`], the
//!   [`SessionContext`], the [`QueryCache`], the navigation [`History`] and
//!   the toast [`Notifier`], and vends screens over them.
//!
//! - **[`QueryCache`]**: typed `(scope, params)` keys, shared in-flight
//!   requests, a per-key generation guard against late responses, and
//!   scope invalidation that refetches mounted observers.
//!
//! - **[`ListController`]**: one list screen per [`ListResource`]. State
//!   lives in the history entry's query string; a page-local search and
//!   activity filter refine the fetched page.
//!
//! - **[`FormModal`]**: one create/edit state machine parametrized by a
//!   [`FormSchema`] (six of them, one per resource), with slug derivation,
//!   validation, uploads and nested book collections.
//!
//! - **[`Dashboard`]**: stats, activity, metric cards and the overview
//!   chart geometry.
//!
//! [`AdminClient`]: bookdesk_api::AdminClient

pub mod cache;
pub mod chart;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod form;
pub mod list;
pub mod notify;
pub mod resource;
pub mod route;
pub mod session;
pub mod upload;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{QueryCache, QueryObserver, QueryView, Snapshot};
pub use chart::{ChartGeometry, ChartState, sparkline};
pub use config::{ConsoleConfig, DEFAULT_API_URL, DEFAULT_PAGE_SIZE};
pub use console::Console;
pub use dashboard::{Dashboard, DashboardSnapshot, MetricCard};
pub use error::{CoreError, FieldErrors};
pub use form::{
    AuthorForm, BookForm, CategoryForm, FieldDescriptor, FieldKind, FormMode, FormModal,
    FormSchema, FormValues, SettingForm, SubcategoryForm, UserForm, slugify,
};
pub use list::{
    ActiveFilter, AuthorList, BookList, CategoryList, DeleteOptions, ListController, ListDisplay,
    ListResource, ListState, ListView, SettingList, SubcategoryList, UserList,
};
pub use notify::{Notifier, Toast, ToastLevel};
pub use resource::{CacheKey, QueryScope, Resource};
pub use route::{History, Location, Route};
pub use session::{MemoryTokenStore, Session, SessionContext, TokenStore, UserInfo};
pub use upload::{LocalFile, UploadSlot};

// The wire layer, for consumers that only depend on this crate.
pub use bookdesk_api as api;
