// ── Dashboard service ──
//
// Summary totals, recent activity, metric cards and the overview series,
// all read through the query cache so repeated renders share requests.
// Each section degrades on its own: one failing endpoint never blanks the
// others.

use std::sync::Arc;

use bookdesk_api::{Activity, DashboardStats, MetricKind, MetricPeriod, Overview};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::chart::{ChartState, chart_width};
use crate::console::Console;
use crate::error::CoreError;
use crate::resource::{CacheKey, QueryScope};

/// Selectable overview ranges, in days.
pub const OVERVIEW_RANGES: [u32; 4] = [7, 14, 30, 60];
pub const DEFAULT_OVERVIEW_DAYS: u32 = 30;

/// Cards shown on a fresh dashboard.
pub const DEFAULT_CARDS: [(MetricKind, MetricPeriod); 3] = [
    (MetricKind::Books, MetricPeriod::Total),
    (MetricKind::Downloads, MetricPeriod::Week),
    (MetricKind::Views, MetricPeriod::Day),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricCard {
    pub kind: MetricKind,
    pub period: MetricPeriod,
    /// `None` when the count could not be loaded.
    pub count: Option<u64>,
}

/// Everything the overview screen renders, each part optional.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub stats: Option<DashboardStats>,
    pub activity: Option<Activity>,
    pub metrics: Vec<MetricCard>,
    pub days: u32,
    pub overview: Option<Overview>,
}

fn unshare(err: &Arc<CoreError>) -> CoreError {
    CoreError::clone(err)
}

pub struct Dashboard {
    console: Console,
    cards: Vec<(MetricKind, MetricPeriod)>,
    days: u32,
}

impl Dashboard {
    pub fn new(console: Console) -> Self {
        Self {
            console,
            cards: DEFAULT_CARDS.to_vec(),
            days: DEFAULT_OVERVIEW_DAYS,
        }
    }

    pub fn cards(&self) -> &[(MetricKind, MetricPeriod)] {
        &self.cards
    }

    /// Change the period of the card showing `kind`.
    pub fn set_period(&mut self, kind: MetricKind, period: MetricPeriod) {
        for card in &mut self.cards {
            if card.0 == kind {
                card.1 = period;
            }
        }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn set_days(&mut self, days: u32) -> Result<(), CoreError> {
        if !OVERVIEW_RANGES.contains(&days) {
            return Err(CoreError::invalid(
                "days",
                format!("Range must be one of {OVERVIEW_RANGES:?} days"),
            ));
        }
        self.days = days;
        Ok(())
    }

    pub async fn summary(&self) -> Result<Arc<DashboardStats>, CoreError> {
        let client = self.console.client().clone();
        self.console
            .cache()
            .fetch(CacheKey::new(QueryScope::Stats), move || {
                let client = client.clone();
                async move { Ok::<_, CoreError>(client.stats().await?) }
            })
            .await
            .map_err(|e| unshare(&e))
    }

    pub async fn activity(&self) -> Result<Arc<Activity>, CoreError> {
        let client = self.console.client().clone();
        self.console
            .cache()
            .fetch(CacheKey::new(QueryScope::StatsActivity), move || {
                let client = client.clone();
                async move { Ok::<_, CoreError>(client.activity().await?) }
            })
            .await
            .map_err(|e| unshare(&e))
    }

    pub async fn metric(&self, kind: MetricKind, period: MetricPeriod) -> Result<u64, CoreError> {
        let client = self.console.client().clone();
        let key = CacheKey::new(QueryScope::StatsMetrics)
            .param("type", kind)
            .param("period", period);
        self.console
            .cache()
            .fetch(key, move || {
                let client = client.clone();
                async move { Ok::<_, CoreError>(client.metric(kind, period).await?) }
            })
            .await
            .map(|count| *count)
            .map_err(|e| unshare(&e))
    }

    /// Every configured card; failures show as an unknown count.
    pub async fn metrics(&self) -> Vec<MetricCard> {
        let requests = self.cards.iter().map(|&(kind, period)| async move {
            let count = match self.metric(kind, period).await {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!(%kind, %period, error = %e, "metric unavailable");
                    None
                }
            };
            MetricCard {
                kind,
                period,
                count,
            }
        });
        join_all(requests).await
    }

    pub async fn overview(&self) -> Result<Arc<Overview>, CoreError> {
        let client = self.console.client().clone();
        let days = self.days;
        self.console
            .cache()
            .fetch(CacheKey::new(QueryScope::StatsOverview).param("days", days), move || {
                let client = client.clone();
                async move { Ok::<_, CoreError>(client.overview(days).await?) }
            })
            .await
            .map_err(|e| unshare(&e))
    }

    /// Chart for the current range.
    pub async fn chart(&self, container_width: Option<f64>) -> ChartState {
        let width = chart_width(container_width);
        match self.overview().await {
            Ok(overview) => ChartState::new(false, &overview.items, width),
            Err(e) => {
                warn!(days = self.days, error = %e, "overview unavailable");
                ChartState::new(false, &[], width)
            }
        }
    }

    /// Load every section concurrently.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        let (stats, activity, metrics, overview) = tokio::join!(
            self.summary(),
            self.activity(),
            self.metrics(),
            self.overview()
        );
        let report = |section: &str, e: &CoreError| warn!(section, error = %e, "dashboard section unavailable");
        DashboardSnapshot {
            stats: stats.inspect_err(|e| report("stats", e)).ok().map(Arc::unwrap_or_clone),
            activity: activity
                .inspect_err(|e| report("activity", e))
                .ok()
                .map(Arc::unwrap_or_clone),
            metrics,
            days: self.days,
            overview: overview
                .inspect_err(|e| report("overview", e))
                .ok()
                .map(Arc::unwrap_or_clone),
        }
    }

    /// Drop cached dashboard data so the next read goes to the server.
    pub async fn refresh(&self) {
        let cache = self.console.cache();
        cache
            .invalidate(|key| {
                matches!(
                    key.scope,
                    QueryScope::Stats
                        | QueryScope::StatsActivity
                        | QueryScope::StatsMetrics
                        | QueryScope::StatsOverview
                )
            })
            .await;
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("cards", &self.cards)
            .field("days", &self.days)
            .finish_non_exhaustive()
    }
}
