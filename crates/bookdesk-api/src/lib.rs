// bookdesk-api: Async Rust client for the bookstore admin REST API
//
// One inherent method on `AdminClient` per (resource, operation) pair.
// Methods build the query or body, call the transport, and hand back parsed
// records or an `Error`. Caching and retry policy live in `bookdesk-core`.

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod client;
mod de;
pub mod error;
pub mod list;
pub mod models;
pub mod stats;
pub mod storage;
pub mod transport;

pub use auth::{Anonymous, AuthHandler, LOGIN_PATH, LoginResponse};
pub use client::AdminClient;
pub use de::bit;
pub use error::Error;
pub use list::{ListParams, ListResult};
pub use models::{
    Author, AuthorPayload, AuthorRef, AuthorRole, Book, BookAuthor, BookPayload,
    BookSpecification, Category, CategoryPayload, Setting, SettingPayload, SpecificationPayload,
    Subcategory, SubcategoryPayload, User, UserPayload,
};
pub use stats::{
    Activity, DashboardStats, MetricKind, MetricPeriod, Overview, OverviewPoint, RecentDownload,
    RecentViews, metric_count,
};
pub use storage::{StorageCategory, UploadFile};
pub use transport::{TlsMode, TransportConfig};
