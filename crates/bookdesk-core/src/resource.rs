// Resource identities and typed cache keys.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A server-managed entity type with its own CRUD endpoints.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Resource {
    Books,
    Authors,
    Categories,
    Subcategories,
    Users,
    Settings,
}

impl Resource {
    /// Singular display name used in notifications ("Book created successfully").
    pub fn singular(self) -> &'static str {
        match self {
            Self::Books => "Book",
            Self::Authors => "Author",
            Self::Categories => "Category",
            Self::Subcategories => "Subcategory",
            Self::Users => "User",
            Self::Settings => "Setting",
        }
    }

    /// Cache scope holding this resource's lists.
    pub fn scope(self) -> QueryScope {
        match self {
            Self::Books => QueryScope::Books,
            Self::Authors => QueryScope::Authors,
            Self::Categories => QueryScope::Categories,
            Self::Subcategories => QueryScope::Subcategories,
            Self::Users => QueryScope::Users,
            Self::Settings => QueryScope::Settings,
        }
    }
}

/// The resource-name half of a cache key. `invalidate` matches on this,
/// ignoring params.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString)]
pub enum QueryScope {
    #[strum(serialize = "admin-books")]
    Books,
    #[strum(serialize = "admin-authors")]
    Authors,
    #[strum(serialize = "admin-categories")]
    Categories,
    #[strum(serialize = "admin-subcategories")]
    Subcategories,
    #[strum(serialize = "admin-users")]
    Users,
    #[strum(serialize = "admin-settings")]
    Settings,
    #[strum(serialize = "admin-stats")]
    Stats,
    #[strum(serialize = "admin-stats-activity")]
    StatsActivity,
    #[strum(serialize = "admin-stats-metrics")]
    StatsMetrics,
    #[strum(serialize = "admin-stats-overview")]
    StatsOverview,
    #[strum(serialize = "admin-book-detail")]
    BookDetail,
}

/// `(scope, params)`: identifies one cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub scope: QueryScope,
    pub params: BTreeMap<String, String>,
}

impl CacheKey {
    pub fn new(scope: QueryScope) -> Self {
        Self {
            scope,
            params: BTreeMap::new(),
        }
    }

    pub fn with_params(scope: QueryScope, params: BTreeMap<String, String>) -> Self {
        Self { scope, params }
    }

    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.insert(name.to_owned(), value.to_string());
        self
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scope)?;
        let mut sep = '?';
        for (name, value) in &self.params {
            write!(f, "{sep}{name}={value}")?;
            sep = '&';
        }
        Ok(())
    }
}
