// Dashboard statistics endpoints and their response adapters.
//
// `/stats/metrics` has no stable shape; `metric_count` is the single
// adapter that reads a count out of whatever the server returns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::client::AdminClient;
use crate::de;
use crate::error::Error;

const STATS: &str = "/api/admin/stats";
const ACTIVITY: &str = "/api/admin/stats/activity";
const METRICS: &str = "/api/admin/stats/metrics";
const OVERVIEW: &str = "/api/admin/stats/overview";

/// Counter shown on a metric card.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MetricKind {
    Books,
    Downloads,
    Views,
}

/// Time window a metric is counted over.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum MetricPeriod {
    #[serde(rename = "1d")]
    #[strum(serialize = "1d")]
    Day,
    #[serde(rename = "7d")]
    #[strum(serialize = "7d")]
    Week,
    #[serde(rename = "30d")]
    #[strum(serialize = "30d")]
    Month,
    #[serde(rename = "total")]
    #[strum(serialize = "total")]
    Total,
}

/// `GET /stats`: headline totals. Unknown totals are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default, deserialize_with = "de::count")]
    pub total_authors: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `GET /stats/activity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub recent_download: Option<RecentDownload>,
    #[serde(default)]
    pub views_last_hour: Option<RecentViews>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentDownload {
    #[serde(default, deserialize_with = "de::text")]
    pub title: String,
    #[serde(default, deserialize_with = "de::count")]
    pub count: u64,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub last_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentViews {
    #[serde(default, deserialize_with = "de::count")]
    pub count: u64,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub last_at: Option<String>,
}

/// `GET /stats/overview?days=N`: one point per day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    #[serde(default)]
    pub items: Vec<OverviewPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewPoint {
    #[serde(default, deserialize_with = "de::opt_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "de::count")]
    pub views: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub downloads: u64,
}

fn as_count(value: &Value) -> u64 {
    de::number(value).unwrap_or(0)
}

/// Read the count for `kind` out of a `/stats/metrics` response.
///
/// Shapes are tried in order: an `items[]` entry whose `key`, `name` or
/// `type` equals the metric and carries a `count`; `res[type]` as a number
/// or `{count}`; `res.counts[type]`. Anything else counts as zero.
pub fn metric_count(raw: &Value, kind: MetricKind) -> u64 {
    let Some(obj) = raw.as_object() else {
        return 0;
    };
    let name = kind.to_string();

    if let Some(items) = obj.get("items").and_then(Value::as_array) {
        let found = items.iter().find(|item| {
            ["key", "name", "type"]
                .iter()
                .any(|field| item.get(field).and_then(Value::as_str) == Some(name.as_str()))
        });
        if let Some(count) = found.and_then(|item| item.get("count")) {
            return as_count(count);
        }
    }

    match obj.get(&name) {
        Some(v @ Value::Number(_)) => return as_count(v),
        Some(Value::Object(inner)) if inner.contains_key("count") => {
            return inner.get("count").map_or(0, as_count);
        }
        _ => {}
    }

    obj.get("counts")
        .and_then(|counts| counts.get(&name))
        .filter(|v| !v.is_null())
        .map_or(0, as_count)
}

impl AdminClient {
    pub async fn stats(&self) -> Result<DashboardStats, Error> {
        self.get(STATS, &BTreeMap::<String, String>::new()).await
    }

    pub async fn activity(&self) -> Result<Activity, Error> {
        self.get(ACTIVITY, &BTreeMap::<String, String>::new()).await
    }

    /// Raw `/stats/metrics` response; feed it to [`metric_count`].
    pub async fn metrics_raw(&self, kind: MetricKind, period: MetricPeriod) -> Result<Value, Error> {
        self.get(
            METRICS,
            &[("type", kind.to_string()), ("period", period.to_string())],
        )
        .await
    }

    /// Normalized count for one metric card.
    pub async fn metric(&self, kind: MetricKind, period: MetricPeriod) -> Result<u64, Error> {
        let raw = self.metrics_raw(kind, period).await?;
        Ok(metric_count(&raw, kind))
    }

    pub async fn overview(&self, days: u32) -> Result<Overview, Error> {
        self.get(OVERVIEW, &[("days", days)]).await
    }
}
