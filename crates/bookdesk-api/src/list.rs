// ── List requests and the list-shape normalization boundary ──
//
// List endpoints answer with a bare array, `{items: [...]}` or
// `{categories: [...]}` depending on the resource. Everything past this
// module sees one canonical `ListResult<T>`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::de;

/// Query parameters for a list endpoint.
///
/// Only set values are sent; an unset `q` or `active` is omitted from the
/// query string rather than sent empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub q: Option<String>,
    pub active: Option<u8>,
    /// Resource-specific filters (`category_id`, `featured`, ...).
    pub filters: BTreeMap<String, String>,
}

impl ListParams {
    /// Page-and-limit params with nothing else set.
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Add a resource-specific filter.
    pub fn with_filter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.filters.insert(name.into(), value.to_string());
        self
    }

    /// Flatten into ordered key/value pairs. This is both the wire query and
    /// the cache-key representation.
    pub fn to_pairs(&self) -> BTreeMap<String, String> {
        let mut pairs = BTreeMap::new();
        if let Some(page) = self.page {
            pairs.insert("page".to_owned(), page.to_string());
        }
        if let Some(limit) = self.limit {
            pairs.insert("limit".to_owned(), limit.to_string());
        }
        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            pairs.insert("q".to_owned(), q.to_owned());
        }
        if let Some(active) = self.active {
            pairs.insert("active".to_owned(), active.to_string());
        }
        for (name, value) in &self.filters {
            if !value.is_empty() {
                pairs.insert(name.clone(), value.clone());
            }
        }
        pairs
    }
}

/// One page of records, in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    /// Server-side total across all pages, when reported.
    pub total: Option<u64>,
    /// Server-side page count, when reported.
    pub total_pages: Option<u64>,
}

impl<T> Default for ListResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: None,
            total_pages: None,
        }
    }
}

impl<T> ListResult<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Every list shape the server is known to produce.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope<T> {
    Bare(Vec<T>),
    Items {
        items: Vec<T>,
        #[serde(default, deserialize_with = "de::opt_count")]
        total: Option<u64>,
        #[serde(default, rename = "totalPages", deserialize_with = "de::opt_count")]
        total_pages: Option<u64>,
    },
    Categories {
        categories: Vec<T>,
        #[serde(default, deserialize_with = "de::opt_count")]
        total: Option<u64>,
    },
}

impl<T> From<ListEnvelope<T>> for ListResult<T> {
    fn from(envelope: ListEnvelope<T>) -> Self {
        match envelope {
            ListEnvelope::Bare(items) => Self {
                items,
                total: None,
                total_pages: None,
            },
            ListEnvelope::Items {
                items,
                total,
                total_pages,
            } => Self {
                items,
                total,
                total_pages,
            },
            ListEnvelope::Categories { categories, total } => Self {
                items: categories,
                total,
                total_pages: None,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u64,
    }

    fn normalize(value: serde_json::Value) -> ListResult<Row> {
        serde_json::from_value::<ListEnvelope<Row>>(value)
            .unwrap()
            .into()
    }

    #[test]
    fn bare_array_has_no_totals() {
        let result = normalize(json!([{"id": 1}, {"id": 2}]));
        assert_eq!(result.len(), 2);
        assert_eq!(result.total, None);
    }

    #[test]
    fn items_envelope_keeps_string_totals() {
        let result = normalize(json!({"items": [{"id": 1}], "total": "41", "totalPages": 3}));
        assert_eq!(result.items, vec![Row { id: 1 }]);
        assert_eq!(result.total, Some(41));
        assert_eq!(result.total_pages, Some(3));
    }

    #[test]
    fn categories_envelope_is_normalized() {
        let result = normalize(json!({"categories": [{"id": 5}]}));
        assert_eq!(result.items, vec![Row { id: 5 }]);
    }

    #[test]
    fn pairs_skip_unset_and_empty_values() {
        let params = ListParams {
            q: Some(String::new()),
            active: Some(1),
            ..ListParams::page(2, 20)
        }
        .with_filter("category_id", 7)
        .with_filter("featured", "");

        let pairs = params.to_pairs();
        assert_eq!(pairs.get("page").map(String::as_str), Some("2"));
        assert_eq!(pairs.get("active").map(String::as_str), Some("1"));
        assert_eq!(pairs.get("category_id").map(String::as_str), Some("7"));
        assert!(!pairs.contains_key("q"));
        assert!(!pairs.contains_key("featured"));
    }
}
